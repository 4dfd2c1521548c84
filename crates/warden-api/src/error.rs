//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! | Error | Status |
//! |-------|--------|
//! | `NotFound` | 404 |
//! | `Forbidden` | 403 |
//! | `CapacityExceeded`, `InvalidTransition`, `Conflict` | 409 |
//! | `ValidationFailed` | 422 |
//! | missing caller | 401 |
//! | malformed request | 400 |
//! | store failure | 500 |

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use warden_core::store::StoreError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("no authenticated caller")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A command rejected by a custody rule.
  #[error(transparent)]
  Domain(#[from] warden_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Split a backend error into a domain rejection or an internal failure.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.domain() {
      Some(domain) => Self::Domain(domain.clone()),
      None => Self::Store(Box::new(err)),
    }
  }

  pub fn status(&self) -> StatusCode {
    use warden_core::Error as E;
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Domain(e) => match e {
        E::NotFound { .. } => StatusCode::NOT_FOUND,
        E::Forbidden(_) => StatusCode::FORBIDDEN,
        E::CapacityExceeded { .. } | E::InvalidTransition(_) | E::Conflict(_) => {
          StatusCode::CONFLICT
        }
        E::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
      },
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::Unauthorized => "unauthorized",
      Self::BadRequest(_) => "bad_request",
      Self::Domain(e) => e.kind(),
      Self::Store(_) => "internal",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let kind = self.kind();
    match &self {
      ApiError::Store(e) => tracing::error!(error = %e, "store failure"),
      other => tracing::debug!(kind, error = %other, "request rejected"),
    }
    (status, Json(json!({ "error": self.to_string(), "kind": kind }))).into_response()
  }
}
