//! Work assignments and their payment.
//!
//! A work record is editable while its payment is pending. Approving the
//! payment freezes it for good.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

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
pub enum PaymentStatus {
  Pending,
  Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
  pub work_id:        Uuid,
  pub person_id:      Uuid,
  pub work_date:      NaiveDate,
  pub task:           String,
  pub hours_worked:   f64,
  /// Amount owed, in minor currency units.
  pub payment_cents:  i64,
  pub payment_status: PaymentStatus,
  /// Set once, when the payment is approved.
  pub payment_date:   Option<NaiveDate>,
  pub recorded_at:    DateTime<Utc>,
}

/// Input to [`crate::store::CustodyStore::record_work`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkRecord {
  pub person_id:     Uuid,
  pub work_date:     NaiveDate,
  pub task:          String,
  pub hours_worked:  f64,
  pub payment_cents: i64,
}

/// Partial update for a pending work record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkUpdate {
  pub work_date:     Option<NaiveDate>,
  pub task:          Option<String>,
  pub hours_worked:  Option<f64>,
  pub payment_cents: Option<i64>,
}

fn validate_hours(hours: f64) -> Result<()> {
  if hours.is_finite() && hours > 0.0 && hours <= 24.0 {
    Ok(())
  } else {
    Err(Error::ValidationFailed(format!(
      "hours worked must be in (0, 24], got {hours}"
    )))
  }
}

fn validate_payment(cents: i64) -> Result<()> {
  if cents >= 0 {
    Ok(())
  } else {
    Err(Error::ValidationFailed(format!(
      "payment amount cannot be negative, got {cents}"
    )))
  }
}

impl NewWorkRecord {
  pub fn into_record(self, now: DateTime<Utc>) -> Result<WorkRecord> {
    validate_hours(self.hours_worked)?;
    validate_payment(self.payment_cents)?;
    Ok(WorkRecord {
      work_id: Uuid::new_v4(),
      person_id: self.person_id,
      work_date: self.work_date,
      task: self.task,
      hours_worked: self.hours_worked,
      payment_cents: self.payment_cents,
      payment_status: PaymentStatus::Pending,
      payment_date: None,
      recorded_at: now,
    })
  }
}

impl WorkRecord {
  /// Fail once the record has been paid. `action` names what was attempted.
  pub fn ensure_editable(&self, action: &str) -> Result<()> {
    match self.payment_status {
      PaymentStatus::Pending => Ok(()),
      PaymentStatus::Paid => Err(Error::InvalidTransition(format!(
        "cannot {action} work record {}: already paid",
        self.work_id
      ))),
    }
  }

  pub fn apply(&mut self, update: WorkUpdate) -> Result<()> {
    self.ensure_editable("update")?;
    if let Some(hours) = update.hours_worked {
      validate_hours(hours)?;
    }
    if let Some(cents) = update.payment_cents {
      validate_payment(cents)?;
    }

    if let Some(date) = update.work_date {
      self.work_date = date;
    }
    if let Some(task) = update.task {
      self.task = task;
    }
    if let Some(hours) = update.hours_worked {
      self.hours_worked = hours;
    }
    if let Some(cents) = update.payment_cents {
      self.payment_cents = cents;
    }
    Ok(())
  }

  pub fn mark_paid(&mut self, today: NaiveDate) -> Result<()> {
    self.ensure_editable("approve payment for")?;
    self.payment_status = PaymentStatus::Paid;
    self.payment_date = Some(today);
    Ok(())
  }
}
