//! Visit scheduling conflict detection.
//!
//! Two windows conflict when they share a date and their half-open intervals
//! intersect: `a.start < b.end && a.end > b.start`. Back-to-back visits
//! (one ending exactly when the next starts) do not conflict.

use uuid::Uuid;

use crate::visit::{Visit, VisitStatus, VisitWindow};

pub fn overlaps(a: &VisitWindow, b: &VisitWindow) -> bool {
  a.date == b.date && a.time_start < b.time_end && a.time_end > b.time_start
}

/// The first scheduled visit in `existing` that clashes with `window`,
/// skipping `exclude` (the visit being rescheduled, if any).
///
/// `existing` should hold the person's visits; visits that are not
/// `Scheduled` never conflict.
pub fn find_conflict<'a>(
  window: &VisitWindow,
  existing: impl IntoIterator<Item = &'a Visit>,
  exclude: Option<Uuid>,
) -> Option<&'a Visit> {
  existing.into_iter().find(|v| {
    v.status == VisitStatus::Scheduled
      && Some(v.visit_id) != exclude
      && overlaps(&v.window, window)
  })
}
