//! Sentence adjustment decisions.
//!
//! A pending adjustment is decided exactly once. Approval is what shifts the
//! person's expected release date, so refusing a second decision is what
//! keeps the delta from being applied twice under retries.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  behaviour::{AdjustmentStatus, BehaviourRecord},
  person::Person,
};

impl BehaviourRecord {
  fn ensure_pending(&self, action: &str) -> Result<()> {
    if self.adjustment_status == AdjustmentStatus::Pending {
      Ok(())
    } else {
      Err(Error::InvalidTransition(format!(
        "cannot {action} behaviour record {}: adjustment is {}",
        self.record_id, self.adjustment_status
      )))
    }
  }

  pub fn reject(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
    self.ensure_pending("reject")?;
    self.adjustment_status = AdjustmentStatus::Rejected;
    self.rejected_at = Some(now);
    self.rejection_reason = reason;
    Ok(())
  }
}

/// Approve `record` and apply its delta to `person`.
///
/// Both values are mutated together or not at all; the caller persists them
/// in one transaction.
pub fn approve(
  record: &mut BehaviourRecord,
  person: &mut Person,
  now: DateTime<Utc>,
) -> Result<()> {
  record.ensure_pending("approve")?;
  if record.person_id != person.person_id {
    return Err(Error::InvalidTransition(format!(
      "behaviour record {} does not belong to person {}",
      record.record_id, person.person_id
    )));
  }

  person.adjust_expected_release(record.sentence_adjustment_days, now)?;
  record.adjustment_status = AdjustmentStatus::Approved;
  record.approved_at = Some(now);
  Ok(())
}
