//! JSON REST API for warden.
//!
//! Exposes an axum [`Router`] backed by any
//! [`warden_core::store::CustodyStore`]. Authentication and transport are the
//! caller's responsibility: the router expects an upstream layer to put the
//! authenticated [`warden_core::Caller`] into the request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", warden_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod behaviours;
pub mod error;
pub mod extract;
pub mod facilities;
pub mod persons;
pub mod visits;
pub mod work;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use warden_core::store::CustodyStore;

pub use actor::Actor;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CustodyStore + 'static,
{
  Router::new()
    // Facilities
    .route("/facilities", get(facilities::list::<S>).post(facilities::create::<S>))
    .route(
      "/facilities/{id}",
      get(facilities::get_one::<S>).patch(facilities::update::<S>),
    )
    .route("/facilities/{id}/population", get(facilities::population::<S>))
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::admit::<S>))
    .route("/persons/{id}", get(persons::get_one::<S>).patch(persons::amend::<S>))
    .route("/persons/{id}/transfer", post(persons::transfer::<S>))
    .route("/persons/{id}/release", post(persons::release::<S>))
    .route("/persons/{id}/decease", post(persons::decease::<S>))
    .route("/persons/{id}/transfers", get(persons::transfers::<S>))
    .route("/persons/{id}/behaviours", get(behaviours::list_for_person::<S>))
    .route("/persons/{id}/work", get(work::list_for_person::<S>))
    .route("/persons/{id}/visits", get(visits::list_for_person::<S>))
    .route("/persons/{id}/visits/conflict", get(visits::conflict::<S>))
    // Behaviour & sentence adjustment
    .route("/behaviours", post(behaviours::create::<S>))
    .route("/behaviours/approve", post(behaviours::approve_many::<S>))
    .route("/behaviours/{id}", get(behaviours::get_one::<S>))
    .route("/behaviours/{id}/approve", post(behaviours::approve::<S>))
    .route("/behaviours/{id}/reject", post(behaviours::reject::<S>))
    // Work & payment
    .route("/work", post(work::create::<S>))
    .route("/work/{id}", patch(work::update::<S>).delete(work::delete::<S>))
    .route("/work/{id}/pay", post(work::approve_payment::<S>))
    // Visitors & visits
    .route("/visitors", post(visits::register_visitor::<S>))
    .route("/visitors/{id}", get(visits::get_visitor::<S>))
    .route("/visits", post(visits::schedule::<S>))
    .route("/visits/{id}/reschedule", post(visits::reschedule::<S>))
    .route("/visits/{id}/complete", post(visits::complete::<S>))
    .route("/visits/{id}/cancel", post(visits::cancel::<S>))
    .with_state(store)
}
