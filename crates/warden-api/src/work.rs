//! Handlers for work records and payment approval.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/work` | Body: [`NewWorkRecord`]; returns 201 |
//! | `PATCH`  | `/work/{id}` | Pending records only |
//! | `DELETE` | `/work/{id}` | Pending records only; returns 204 |
//! | `POST`   | `/work/{id}/pay` | Pending → Paid |
//! | `GET`    | `/persons/{id}/work` | |

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;
use warden_core::{
  store::CustodyStore,
  work::{NewWorkRecord, WorkRecord, WorkUpdate},
};

use crate::{
  actor::Actor,
  error::ApiError,
  extract::{Json, Path},
};

/// `POST /work`
pub async fn create<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<NewWorkRecord>,
) -> Result<impl IntoResponse, ApiError> {
  let record = store
    .record_work(actor.scope(), body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    work_id = %record.work_id,
    person_id = %record.person_id,
    by = actor.username(),
    "work recorded"
  );
  Ok((StatusCode::CREATED, Json(record)))
}

/// `PATCH /work/{id}`
pub async fn update<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<WorkUpdate>,
) -> Result<Json<WorkRecord>, ApiError> {
  let record = store
    .update_work(actor.scope(), id, body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}

/// `DELETE /work/{id}`
pub async fn delete<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .delete_work(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(work_id = %id, by = actor.username(), "work record deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /work/{id}/pay`
pub async fn approve_payment<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<WorkRecord>, ApiError> {
  let record = store
    .approve_payment(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    work_id = %id,
    amount_cents = record.payment_cents,
    by = actor.username(),
    "payment approved"
  );
  Ok(Json(record))
}

/// `GET /persons/{id}/work`
pub async fn list_for_person<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(person_id): Path<Uuid>,
) -> Result<Json<Vec<WorkRecord>>, ApiError> {
  let records = store
    .list_work(actor.scope(), person_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}
