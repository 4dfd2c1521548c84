//! Facilities: the sites that house persons in custody.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A custodial site with a fixed population ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
  pub facility_id: Uuid,
  /// Short unique code, e.g. `"NRTH-01"`.
  pub code:        String,
  pub name:        String,
  /// Maximum number of persons with `Active` status housed here.
  pub capacity:    u32,
  /// Inactive facilities accept no admissions or transfers.
  pub active:      bool,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::CustodyStore::create_facility`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewFacility {
  pub code:     String,
  pub name:     String,
  pub capacity: u32,
}

/// Partial update for [`crate::store::CustodyStore::update_facility`]. Absent
/// fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacilityUpdate {
  pub name:     Option<String>,
  pub capacity: Option<u32>,
  pub active:   Option<bool>,
}
