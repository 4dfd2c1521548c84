//! Core types and invariant rules for the warden custody system.
//!
//! This crate has no HTTP or database dependencies.
//! Everything here is pure: the rules take current state and report whether
//! a transition is allowed. Backends implementing [`store::CustodyStore`]
//! run these rules inside their transactions.

// Store impls use native `async fn`; the trait spells out `Send` on its
// return types.
#![allow(async_fn_in_trait)]

pub mod adjustment;
pub mod behaviour;
pub mod capacity;
pub mod error;
pub mod facility;
pub mod lifecycle;
pub mod person;
pub mod schedule;
pub mod scope;
pub mod store;
pub mod visit;
pub mod work;

pub use error::{Entity, Error, Result};
pub use scope::{Caller, Role, Scope};
