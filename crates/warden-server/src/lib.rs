//! HTTP server wiring for warden.
//!
//! Mounts [`warden_api::api_router`] under `/api` behind HTTP Basic
//! authentication, with request tracing around everything.

pub mod auth;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::{Request, State},
  middleware::{self, Next},
  response::Response,
  routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use warden_core::{Role, store::CustodyStore};

use auth::{AuthConfig, AuthError, verify_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `warden.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub operators:  Vec<OperatorConfig>,
}

/// One operator allowed to sign in.
#[derive(Deserialize, Clone)]
pub struct OperatorConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub role:          Role,
  /// The facility the operator is posted to. Ignored for administrators.
  pub facility_id:   Option<Uuid>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(store: Arc<S>, auth: Arc<AuthConfig>) -> Router
where
  S: CustodyStore + 'static,
{
  let api = warden_api::api_router(store)
    .layer(middleware::from_fn_with_state(auth, require_auth));

  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, AuthError> {
  let caller = verify_auth(req.headers(), &auth).inspect_err(|e| {
    tracing::warn!(error = %e, path = %req.uri().path(), "authentication failed");
  })?;
  tracing::debug!(username = %caller.username, role = %caller.role, "authenticated");
  req.extensions_mut().insert(caller);
  Ok(next.run(req).await)
}
