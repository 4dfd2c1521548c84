//! Handlers for `/facilities` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/facilities` | Facilities within the caller's scope |
//! | `POST`  | `/facilities` | Global scope only; returns 201 |
//! | `GET`   | `/facilities/{id}` | |
//! | `PATCH` | `/facilities/{id}` | Body: [`FacilityUpdate`] |
//! | `GET`   | `/facilities/{id}/population` | Active count against capacity |

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;
use warden_core::{
  facility::{Facility, FacilityUpdate, NewFacility},
  store::CustodyStore,
};

use crate::{
  actor::Actor,
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /facilities`
pub async fn list<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
) -> Result<Json<Vec<Facility>>, ApiError> {
  let facilities = store
    .list_facilities(actor.scope())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(facilities))
}

/// `POST /facilities`
pub async fn create<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<NewFacility>,
) -> Result<impl IntoResponse, ApiError> {
  let facility = store
    .create_facility(actor.scope(), body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    facility_id = %facility.facility_id,
    code = %facility.code,
    capacity = facility.capacity,
    by = actor.username(),
    "facility created"
  );
  Ok((StatusCode::CREATED, Json(facility)))
}

/// `GET /facilities/{id}`
pub async fn get_one<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Facility>, ApiError> {
  let facility = store
    .get_facility(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(facility))
}

/// `PATCH /facilities/{id}`
pub async fn update<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<FacilityUpdate>,
) -> Result<Json<Facility>, ApiError> {
  let facility = store
    .update_facility(actor.scope(), id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    facility_id = %id,
    capacity = facility.capacity,
    active = facility.active,
    by = actor.username(),
    "facility updated"
  );
  Ok(Json(facility))
}

#[derive(Debug, Serialize)]
pub struct Population {
  pub facility_id: Uuid,
  pub active:      u32,
  pub capacity:    u32,
}

/// `GET /facilities/{id}/population`
pub async fn population<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Population>, ApiError> {
  let scope = actor.scope();
  let facility = store.get_facility(scope, id).await.map_err(ApiError::store)?;
  let active = store.active_count(scope, id).await.map_err(ApiError::store)?;
  Ok(Json(Population {
    facility_id: id,
    active,
    capacity: facility.capacity,
  }))
}
