//! Visitors and scheduled visits.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Shortest bookable visit, in minutes.
pub const MIN_VISIT_MINUTES: i64 = 15;
/// Longest bookable visit, in minutes.
pub const MAX_VISIT_MINUTES: i64 = 120;

// ─── Visitors ────────────────────────────────────────────────────────────────

/// A member of the public. Referenced by visits, owned by none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
  pub visitor_id:   Uuid,
  /// Unique across all visitors.
  pub national_id:  String,
  pub full_name:    String,
  /// Relation to the person visited, e.g. "sister".
  pub relationship: Option<String>,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVisitor {
  pub national_id:  String,
  pub full_name:    String,
  pub relationship: Option<String>,
}

// ─── Visits ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VisitStatus {
  Scheduled,
  Completed,
  Cancelled,
}

/// A half-open `[time_start, time_end)` slot on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitWindow {
  pub date:       NaiveDate,
  pub time_start: NaiveTime,
  pub time_end:   NaiveTime,
}

impl VisitWindow {
  pub fn duration(&self) -> TimeDelta { self.time_end - self.time_start }

  /// The window must end after it starts and last 15–120 minutes.
  pub fn validate(&self) -> Result<()> {
    if self.time_end <= self.time_start {
      return Err(Error::ValidationFailed(format!(
        "visit must end after it starts ({} – {})",
        self.time_start, self.time_end
      )));
    }
    let duration = self.duration();
    if duration < TimeDelta::minutes(MIN_VISIT_MINUTES)
      || duration > TimeDelta::minutes(MAX_VISIT_MINUTES)
    {
      return Err(Error::ValidationFailed(format!(
        "visit must last {MIN_VISIT_MINUTES}–{MAX_VISIT_MINUTES} minutes, got {}s",
        duration.num_seconds()
      )));
    }
    Ok(())
  }

  /// Drop sub-second precision; stored times have whole seconds.
  fn whole_seconds(self) -> Self {
    let trim = |t: NaiveTime| t.with_nanosecond(0).unwrap_or(t);
    Self {
      time_start: trim(self.time_start),
      time_end:   trim(self.time_end),
      ..self
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  pub visit_id:   Uuid,
  pub person_id:  Uuid,
  pub visitor_id: Uuid,
  #[serde(flatten)]
  pub window:     VisitWindow,
  pub status:     VisitStatus,
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::CustodyStore::schedule_visit`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewVisit {
  pub person_id:  Uuid,
  pub visitor_id: Uuid,
  #[serde(flatten)]
  pub window:     VisitWindow,
  pub notes:      Option<String>,
}

impl NewVisit {
  pub fn into_visit(self, now: DateTime<Utc>) -> Result<Visit> {
    let window = self.window.whole_seconds();
    window.validate()?;
    Ok(Visit {
      visit_id:   Uuid::new_v4(),
      person_id:  self.person_id,
      visitor_id: self.visitor_id,
      window,
      status:     VisitStatus::Scheduled,
      notes:      self.notes,
      created_at: now,
    })
  }
}

impl Visit {
  fn ensure_scheduled(&self, action: &str) -> Result<()> {
    if self.status == VisitStatus::Scheduled {
      Ok(())
    } else {
      Err(Error::InvalidTransition(format!(
        "cannot {action} visit {}: it is {}",
        self.visit_id, self.status
      )))
    }
  }

  pub fn reschedule(&mut self, window: VisitWindow) -> Result<()> {
    self.ensure_scheduled("reschedule")?;
    let window = window.whole_seconds();
    window.validate()?;
    self.window = window;
    Ok(())
  }

  pub fn complete(&mut self) -> Result<()> {
    self.ensure_scheduled("complete")?;
    self.status = VisitStatus::Completed;
    Ok(())
  }

  pub fn cancel(&mut self) -> Result<()> {
    self.ensure_scheduled("cancel")?;
    self.status = VisitStatus::Cancelled;
    Ok(())
  }
}
