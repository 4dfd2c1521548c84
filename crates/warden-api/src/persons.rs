//! Handlers for `/persons` endpoints: admission and the custody lifecycle.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/persons` | Optional `?facility_id=…&status=…` |
//! | `POST`  | `/persons` | Admit; body: [`Admission`]; returns 201 |
//! | `GET`   | `/persons/{id}` | |
//! | `PATCH` | `/persons/{id}` | Body: [`PersonAmendment`] |
//! | `POST`  | `/persons/{id}/transfer` | Body: `{"target_facility_id":…,"reason":…}` |
//! | `POST`  | `/persons/{id}/release` | Optional body: `{"reason":…}` |
//! | `POST`  | `/persons/{id}/decease` | |
//! | `GET`   | `/persons/{id}/transfers` | Transfer history, oldest first |

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use warden_core::{
  person::{Admission, Person, PersonAmendment, PersonQuery, TransferRecord},
  store::CustodyStore,
};

use crate::{
  actor::Actor,
  error::ApiError,
  extract::{Json, Path, Query},
};

/// `GET /persons[?facility_id=<id>][&status=<status>]`
pub async fn list<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Query(query): Query<PersonQuery>,
) -> Result<Json<Vec<Person>>, ApiError> {
  let persons = store
    .list_persons(actor.scope(), query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(persons))
}

/// `POST /persons`
pub async fn admit<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<Admission>,
) -> Result<impl IntoResponse, ApiError> {
  let person = store
    .admit(actor.scope(), body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    person_id = %person.person_id,
    facility_id = ?person.facility_id,
    by = actor.username(),
    "person admitted"
  );
  Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /persons/{id}`
pub async fn get_one<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError> {
  let person = store
    .get_person(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(person))
}

/// `PATCH /persons/{id}`
pub async fn amend<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<PersonAmendment>,
) -> Result<Json<Person>, ApiError> {
  let person = store
    .amend_person(actor.scope(), id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(person_id = %id, by = actor.username(), "person amended");
  Ok(Json(person))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TransferBody {
  pub target_facility_id: Uuid,
  pub reason:             Option<String>,
}

/// `POST /persons/{id}/transfer`
pub async fn transfer<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<TransferBody>,
) -> Result<Json<Person>, ApiError> {
  let person = store
    .transfer(actor.scope(), id, body.target_facility_id, body.reason)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    person_id = %id,
    to = %body.target_facility_id,
    by = actor.username(),
    "person transferred"
  );
  Ok(Json(person))
}

/// Optional body of `release` and `reject`; the request may omit it.
#[derive(Debug, Deserialize)]
pub struct ReasonBody {
  pub reason: Option<String>,
}

/// `POST /persons/{id}/release`
pub async fn release<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  body: Option<Json<ReasonBody>>,
) -> Result<Json<Person>, ApiError> {
  let reason = body.and_then(|Json(b)| b.reason);
  let person = store
    .release(actor.scope(), id, reason)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(person_id = %id, by = actor.username(), "person released");
  Ok(Json(person))
}

/// `POST /persons/{id}/decease`
pub async fn decease<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError> {
  let person = store
    .decease(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(person_id = %id, by = actor.username(), "death recorded");
  Ok(Json(person))
}

/// `GET /persons/{id}/transfers`
pub async fn transfers<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<TransferRecord>>, ApiError> {
  let history = store
    .transfer_history(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(history))
}
