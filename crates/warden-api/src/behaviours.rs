//! Handlers for behaviour records and sentence adjustment decisions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/behaviours` | Body: [`NewBehaviourRecord`]; returns 201 |
//! | `GET`  | `/behaviours/{id}` | |
//! | `POST` | `/behaviours/{id}/approve` | Applies the adjustment once |
//! | `POST` | `/behaviours/{id}/reject` | Optional body: `{"reason":…}` |
//! | `POST` | `/behaviours/approve` | Bulk; body: `{"ids":[…]}`; one outcome per id |
//! | `GET`  | `/persons/{id}/behaviours` | |

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{
  behaviour::{BehaviourRecord, NewBehaviourRecord},
  store::CustodyStore,
};

use crate::{
  actor::Actor,
  error::ApiError,
  extract::{Json, Path},
  persons::ReasonBody,
};

/// `POST /behaviours`
pub async fn create<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<NewBehaviourRecord>,
) -> Result<impl IntoResponse, ApiError> {
  let record = store
    .record_behaviour(actor.scope(), body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    record_id = %record.record_id,
    person_id = %record.person_id,
    adjustment_days = record.sentence_adjustment_days,
    status = %record.adjustment_status,
    by = actor.username(),
    "behaviour recorded"
  );
  Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /behaviours/{id}`
pub async fn get_one<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<BehaviourRecord>, ApiError> {
  let record = store
    .get_behaviour(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}

/// `GET /persons/{id}/behaviours`
pub async fn list_for_person<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(person_id): Path<Uuid>,
) -> Result<Json<Vec<BehaviourRecord>>, ApiError> {
  let records = store
    .list_behaviours(actor.scope(), person_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Decisions ────────────────────────────────────────────────────────────────

/// `POST /behaviours/{id}/approve`
pub async fn approve<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<BehaviourRecord>, ApiError> {
  let record = store
    .approve_adjustment(actor.scope(), id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    record_id = %id,
    person_id = %record.person_id,
    adjustment_days = record.sentence_adjustment_days,
    by = actor.username(),
    "adjustment approved"
  );
  Ok(Json(record))
}

/// `POST /behaviours/{id}/reject`
pub async fn reject<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  body: Option<Json<ReasonBody>>,
) -> Result<Json<BehaviourRecord>, ApiError> {
  let reason = body.and_then(|Json(b)| b.reason);
  let record = store
    .reject_adjustment(actor.scope(), id, reason)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(record_id = %id, by = actor.username(), "adjustment rejected");
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct BulkApproveBody {
  pub ids: Vec<Uuid>,
}

/// Result of one record in a bulk approval.
#[derive(Debug, Serialize)]
pub struct ApprovalOutcome {
  pub record_id: Uuid,
  #[serde(flatten)]
  pub outcome:   Outcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
  Approved { record: BehaviourRecord },
  Failed { error: String, kind: &'static str },
}

/// `POST /behaviours/approve`
///
/// Always answers 200; each id carries its own outcome.
pub async fn approve_many<S: CustodyStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<BulkApproveBody>,
) -> Json<Vec<ApprovalOutcome>> {
  let outcomes = store.approve_adjustments(actor.scope(), body.ids).await;

  let mut approved = 0usize;
  let results: Vec<_> = outcomes
    .into_iter()
    .map(|o| {
      let outcome = match o.result {
        Ok(record) => {
          approved += 1;
          Outcome::Approved { record }
        }
        Err(e) => {
          let err = ApiError::store(e);
          Outcome::Failed { error: err.to_string(), kind: err.kind() }
        }
      };
      ApprovalOutcome { record_id: o.record_id, outcome }
    })
    .collect();

  tracing::info!(
    requested = results.len(),
    approved,
    by = actor.username(),
    "bulk adjustment approval"
  );
  Json(results)
}
