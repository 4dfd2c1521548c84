//! HTTP Basic authentication of configured operators.
//!
//! A successful check yields the operator's [`Caller`]; the middleware in
//! [`crate::router`] puts it into the request extensions for the API
//! handlers.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde_json::json;
use thiserror::Error;
use warden_core::Caller;

use crate::OperatorConfig;

/// Credentials accepted by this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub operators: Vec<OperatorConfig>,
}

impl AuthConfig {
  fn operator(&self, username: &str) -> Option<&OperatorConfig> {
    self.operators.iter().find(|op| op.username == username)
  }
}

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("missing or malformed credentials")]
  Malformed,
  #[error("invalid username or password")]
  Rejected,
}

impl IntoResponse for AuthError {
  fn into_response(self) -> Response {
    let mut res = (
      StatusCode::UNAUTHORIZED,
      Json(json!({ "error": self.to_string(), "kind": "unauthorized" })),
    )
      .into_response();
    res.headers_mut().insert(
      header::WWW_AUTHENTICATE,
      HeaderValue::from_static("Basic realm=\"warden\""),
    );
    res
  }
}

/// Verify Basic credentials from `headers` and resolve the operator.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Caller, AuthError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(AuthError::Malformed)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(AuthError::Malformed)?;

  let decoded = B64.decode(encoded).map_err(|_| AuthError::Malformed)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| AuthError::Malformed)?;

  let (username, password) = creds.split_once(':').ok_or(AuthError::Malformed)?;

  let operator = config.operator(username).ok_or(AuthError::Rejected)?;

  let parsed_hash = PasswordHash::new(&operator.password_hash)
    .map_err(|_| AuthError::Rejected)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| AuthError::Rejected)?;

  Ok(Caller {
    username:    operator.username.clone(),
    role:        operator.role,
    facility_id: operator.facility_id,
  })
}
