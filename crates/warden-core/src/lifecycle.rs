//! Person lifecycle transitions.
//!
//! ```text
//!   admit ──► Active ──release──► Released
//!             │  ▲  │
//!             └──┘  └──decease──► Deceased
//!           transfer
//! ```
//!
//! The methods here mutate an in-memory [`Person`] and report violated
//! preconditions; capacity and scope checks are the caller's job, and the
//! caller persists the result only if everything passed.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  person::{Admission, Person, PersonAmendment, PersonStatus},
};

impl Person {
  /// Build a freshly admitted person. Uniqueness and capacity are checked by
  /// the store.
  pub fn admitted(input: Admission, now: DateTime<Utc>) -> Result<Self> {
    let admission_date = input.admission_date.unwrap_or_else(|| now.date_naive());
    if let Some(expected) = input.expected_release_date
      && expected < admission_date
    {
      return Err(Error::ValidationFailed(format!(
        "expected release date {expected} precedes admission date {admission_date}"
      )));
    }

    Ok(Self {
      person_id: Uuid::new_v4(),
      national_id: input.national_id,
      case_number: input.case_number,
      given_name: input.given_name,
      family_name: input.family_name,
      status: PersonStatus::Active,
      facility_id: Some(input.facility_id),
      admission_date,
      expected_release_date: input.expected_release_date,
      actual_release_date: None,
      release_reason: None,
      created_at: now,
      updated_at: now,
    })
  }

  /// The facility an active person is housed in.
  pub fn current_facility(&self) -> Result<Uuid> {
    self.facility_id.ok_or_else(|| {
      Error::InvalidTransition(format!(
        "person {} is not housed in any facility",
        self.person_id
      ))
    })
  }

  /// Fail unless the person is `Active`. `action` names what was attempted.
  pub fn ensure_active(&self, action: &str) -> Result<()> {
    if self.status.is_active() {
      Ok(())
    } else {
      Err(Error::InvalidTransition(format!(
        "cannot {action}: person {} is {}",
        self.person_id, self.status
      )))
    }
  }

  /// Move an active person to `target`. Returns the source facility.
  ///
  /// Status stays `Active`; [`PersonStatus::Transferred`] is never persisted
  /// as a resting state.
  pub fn transfer_to(&mut self, target: Uuid, now: DateTime<Utc>) -> Result<Uuid> {
    self.ensure_active("transfer")?;
    let source = self.current_facility()?;
    if source == target {
      return Err(Error::InvalidTransition(format!(
        "person {} is already housed in facility {target}",
        self.person_id
      )));
    }

    self.facility_id = Some(target);
    self.updated_at = now;
    Ok(source)
  }

  pub fn release(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
    self.close(PersonStatus::Released, reason, now)
  }

  pub fn decease(&mut self, now: DateTime<Utc>) -> Result<()> {
    self.close(PersonStatus::Deceased, None, now)
  }

  fn close(
    &mut self,
    status: PersonStatus,
    reason: Option<String>,
    now: DateTime<Utc>,
  ) -> Result<()> {
    let action = match status {
      PersonStatus::Deceased => "record death",
      _ => "release",
    };
    self.ensure_active(action)?;
    if self.actual_release_date.is_some() {
      return Err(Error::InvalidTransition(format!(
        "person {} already has an actual release date",
        self.person_id
      )));
    }

    self.status = status;
    self.actual_release_date = Some(now.date_naive());
    self.release_reason = reason;
    self.updated_at = now;
    Ok(())
  }

  pub fn amend(&mut self, amendment: PersonAmendment, now: DateTime<Utc>) -> Result<()> {
    self.ensure_active("amend details")?;
    if let Some(expected) = amendment.expected_release_date
      && expected < self.admission_date
    {
      return Err(Error::ValidationFailed(format!(
        "expected release date {expected} precedes admission date {}",
        self.admission_date
      )));
    }

    if let Some(given) = amendment.given_name {
      self.given_name = given;
    }
    if let Some(family) = amendment.family_name {
      self.family_name = family;
    }
    if amendment.expected_release_date.is_some() {
      self.expected_release_date = amendment.expected_release_date;
    }
    self.updated_at = now;
    Ok(())
  }

  /// Shift the expected release date by `days`. A person without an expected
  /// release date is left alone.
  pub fn adjust_expected_release(&mut self, days: i32, now: DateTime<Utc>) -> Result<()> {
    if let Some(date) = self.expected_release_date {
      self.expected_release_date = Some(shift_date(date, days)?);
      self.updated_at = now;
    }
    Ok(())
  }
}

fn shift_date(date: NaiveDate, days: i32) -> Result<NaiveDate> {
  date
    .checked_add_signed(chrono::TimeDelta::days(i64::from(days)))
    .ok_or_else(|| {
      Error::ValidationFailed(format!("shifting {date} by {days} days overflows"))
    })
}
