//! Access scope resolution.
//!
//! An authenticated [`Caller`] is reduced to a [`Scope`] once, at the edge,
//! and that scope is handed explicitly to every store operation. Nothing
//! downstream looks at roles again.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Operator role as assigned by the authentication layer.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  /// Fleet-wide administrative authority.
  Administrator,
  Warden,
  Officer,
  Clerk,
}

/// An authenticated operator, as handed over by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
  pub username:    String,
  pub role:        Role,
  /// The facility this operator is posted to, if any.
  pub facility_id: Option<Uuid>,
}

impl Caller {
  pub fn scope(&self) -> Scope { Scope::resolve(self.role, self.facility_id) }
}

/// The set of facilities a caller may act upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "facility_id", rename_all = "snake_case")]
pub enum Scope {
  /// Unrestricted.
  Global,
  /// Restricted to a single facility.
  Facility(Uuid),
  /// A non-administrative caller with no posting. Authorizes nothing.
  Unassigned,
}

impl Scope {
  pub fn resolve(role: Role, facility_id: Option<Uuid>) -> Self {
    match (role, facility_id) {
      (Role::Administrator, _) => Self::Global,
      (_, Some(id)) => Self::Facility(id),
      (_, None) => Self::Unassigned,
    }
  }

  pub fn is_global(&self) -> bool { matches!(self, Self::Global) }

  /// True iff this scope may act on `facility_id`.
  pub fn authorize(&self, facility_id: Uuid) -> bool {
    match self {
      Self::Global => true,
      Self::Facility(own) => *own == facility_id,
      Self::Unassigned => false,
    }
  }

  /// [`Self::authorize`], surfaced as [`Error::Forbidden`].
  pub fn require(&self, facility_id: Uuid) -> Result<()> {
    if self.authorize(facility_id) {
      Ok(())
    } else {
      Err(Error::Forbidden(format!(
        "caller scope does not cover facility {facility_id}"
      )))
    }
  }

  pub fn require_global(&self, action: &str) -> Result<()> {
    if self.is_global() {
      Ok(())
    } else {
      Err(Error::Forbidden(format!("{action} requires global scope")))
    }
  }
}
