//! Error types for `warden-core`.
//!
//! Every custody operation either commits in full or fails with exactly one
//! of these variants. None of them are retried by the store.

use thiserror::Error;
use uuid::Uuid;

/// The kind of record an identifier failed to resolve to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  Facility,
  Person,
  BehaviourRecord,
  WorkRecord,
  Visit,
  Visitor,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error(
    "facility {facility_id} is at capacity ({active} active of {capacity})"
  )]
  CapacityExceeded {
    facility_id: Uuid,
    capacity:    u32,
    active:      u32,
  },

  #[error("invalid transition: {0}")]
  InvalidTransition(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("validation failed: {0}")]
  ValidationFailed(String),
}

impl Error {
  pub fn not_found(entity: Entity, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }

  /// Short machine-readable tag, stable across message wording changes.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::NotFound { .. } => "not_found",
      Self::Forbidden(_) => "forbidden",
      Self::CapacityExceeded { .. } => "capacity_exceeded",
      Self::InvalidTransition(_) => "invalid_transition",
      Self::Conflict(_) => "conflict",
      Self::ValidationFailed(_) => "validation_failed",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
