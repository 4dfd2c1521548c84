//! Persons in custody and their admission records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Custody status of a person.
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
pub enum PersonStatus {
  Active,
  Released,
  /// Transient label for a person between two facilities. A transfer
  /// completes in one transaction, so this is never a resting status; the
  /// movement itself is kept as a [`TransferRecord`].
  Transferred,
  Deceased,
}

impl PersonStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }

  /// Released and Deceased admit no further transitions.
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Released | Self::Deceased)
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:             Uuid,
  /// Government identifier; unique across the fleet.
  pub national_id:           String,
  /// Court case number; unique across the fleet.
  pub case_number:           String,
  pub given_name:            String,
  pub family_name:           String,
  pub status:                PersonStatus,
  /// The facility the person resides in (or last resided in, once
  /// terminal). Never `None` while `Active`.
  pub facility_id:           Option<Uuid>,
  pub admission_date:        NaiveDate,
  pub expected_release_date: Option<NaiveDate>,
  /// Fixed exactly once, on release or death.
  pub actual_release_date:   Option<NaiveDate>,
  pub release_reason:        Option<String>,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
}

/// Input to [`crate::store::CustodyStore::admit`].
#[derive(Debug, Clone, Deserialize)]
pub struct Admission {
  pub national_id:           String,
  pub case_number:           String,
  pub given_name:            String,
  pub family_name:           String,
  pub facility_id:           Uuid,
  /// Defaults to today when absent.
  pub admission_date:        Option<NaiveDate>,
  pub expected_release_date: Option<NaiveDate>,
}

/// Editable details of an active person. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonAmendment {
  pub given_name:            Option<String>,
  pub family_name:           Option<String>,
  pub expected_release_date: Option<NaiveDate>,
}

/// Filter for [`crate::store::CustodyStore::list_persons`]. The caller's
/// scope is applied on top of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonQuery {
  pub facility_id: Option<Uuid>,
  pub status:      Option<PersonStatus>,
}

// ─── Transfers ───────────────────────────────────────────────────────────────

/// One completed move between facilities. Written in the same transaction
/// that changes the person's facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
  pub transfer_id:      Uuid,
  pub person_id:        Uuid,
  pub from_facility_id: Uuid,
  pub to_facility_id:   Uuid,
  pub reason:           Option<String>,
  pub transferred_at:   DateTime<Utc>,
}
