//! The authenticated caller, as seen by handlers.
//!
//! An upstream authentication layer inserts a [`Caller`] into the request
//! extensions. Handlers take [`Actor`] and derive the caller's [`Scope`] from
//! it; a request that reaches a handler without one is rejected with 401.

use axum::{extract::FromRequestParts, http::request::Parts};
use warden_core::{Caller, Scope};

use crate::error::ApiError;

pub struct Actor(pub Caller);

impl Actor {
  pub fn scope(&self) -> Scope { self.0.scope() }

  pub fn username(&self) -> &str { &self.0.username }
}

impl<S> FromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Caller>()
      .cloned()
      .map(Actor)
      .ok_or(ApiError::Unauthorized)
  }
}
