//! Handlers for visitors and visit scheduling.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/visitors` | Body: [`NewVisitor`]; returns 201 |
//! | `GET`  | `/visitors/{id}` | |
//! | `POST` | `/visits` | Body: [`NewVisit`]; 409 on overlap |
//! | `POST` | `/visits/{id}/reschedule` | Body: [`VisitWindow`] |
//! | `POST` | `/visits/{id}/complete` | |
//! | `POST` | `/visits/{id}/cancel` | |
//! | `GET`  | `/persons/{id}/visits` | |
//! | `GET`  | `/persons/{id}/visits/conflict` | `?date&time_start&time_end[&exclude]` |

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{
  store::CustodyStore,
  visit::{NewVisit, NewVisitor, Visit, VisitWindow, Visitor},
};

use crate::{
  actor::Actor,
  error::ApiError,
  extract::{Json, Path, Query},
};

// ─── Visitors ─────────────────────────────────────────────────────────────────

/// `POST /visitors`
pub async fn register_visitor<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<NewVisitor>,
) -> Result<impl IntoResponse, ApiError> {
  let visitor = store
    .register_visitor(body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    visitor_id = %visitor.visitor_id,
    by = actor.username(),
    "visitor registered"
  );
  Ok((StatusCode::CREATED, Json(visitor)))
}

/// `GET /visitors/{id}`
pub async fn get_visitor<S: CustodyStore>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Visitor>, ApiError> {
  let visitor = store.get_visitor(id).await.map_err(ApiError::store)?;
  Ok(Json(visitor))
}

// ─── Visits ───────────────────────────────────────────────────────────────────

/// `POST /visits`
pub async fn schedule<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<NewVisit>,
) -> Result<impl IntoResponse, ApiError> {
  let visit = store
    .schedule_visit(actor.scope(), body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    visit_id = %visit.visit_id,
    person_id = %visit.person_id,
    date = %visit.window.date,
    by = actor.username(),
    "visit scheduled"
  );
  Ok((StatusCode::CREATED, Json(visit)))
}

/// `POST /visits/{id}/reschedule`
pub async fn reschedule<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(window): Json<VisitWindow>,
) -> Result<Json<Visit>, ApiError> {
  let visit = store
    .reschedule_visit(actor.scope(), id, window)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(visit_id = %id, date = %window.date, by = actor.username(), "visit rescheduled");
  Ok(Json(visit))
}

/// `POST /visits/{id}/complete`
pub async fn complete<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Visit>, ApiError> {
  let visit = store
    .complete_visit(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(visit_id = %id, by = actor.username(), "visit completed");
  Ok(Json(visit))
}

/// `POST /visits/{id}/cancel`
pub async fn cancel<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Visit>, ApiError> {
  let visit = store
    .cancel_visit(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(visit_id = %id, by = actor.username(), "visit cancelled");
  Ok(Json(visit))
}

/// `GET /persons/{id}/visits`
pub async fn list_for_person<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(person_id): Path<Uuid>,
) -> Result<Json<Vec<Visit>>, ApiError> {
  let visits = store
    .list_visits(actor.scope(), person_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(visits))
}

#[derive(Debug, Deserialize)]
pub struct ConflictParams {
  #[serde(flatten)]
  pub window:  VisitWindow,
  pub exclude: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ConflictAnswer {
  pub conflict: bool,
}

/// `GET /persons/{id}/visits/conflict?date=…&time_start=…&time_end=…[&exclude=…]`
pub async fn conflict<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(person_id): Path<Uuid>,
  Query(params): Query<ConflictParams>,
) -> Result<Json<ConflictAnswer>, ApiError> {
  let conflict = store
    .has_visit_conflict(actor.scope(), person_id, params.window, params.exclude)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ConflictAnswer { conflict }))
}
