//! The `CustodyStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `warden-store-sqlite`).
//! Higher layers (`warden-api`, `warden-server`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Every mutating method is one unit of work: it validates the command
//! against current state, the caller's [`Scope`], and the capacity and
//! scheduling invariants, then either commits all of its writes or none.
//! Implementations must serialize the reads that guard a write (active
//! counts, uniqueness, visit overlap, adjustment status) against concurrent
//! writers.

use std::future::Future;

use uuid::Uuid;

use crate::{
  behaviour::{BehaviourRecord, NewBehaviourRecord},
  facility::{Facility, FacilityUpdate, NewFacility},
  person::{Admission, Person, PersonAmendment, PersonQuery, TransferRecord},
  scope::Scope,
  visit::{NewVisit, NewVisitor, Visit, VisitWindow, Visitor},
  work::{NewWorkRecord, WorkRecord, WorkUpdate},
};

/// A backend error that may wrap a domain [`crate::Error`].
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error behind this failure, if it was a rejected command
  /// rather than an infrastructure fault.
  fn domain(&self) -> Option<&crate::Error>;
}

/// Per-record result of [`CustodyStore::approve_adjustments`].
#[derive(Debug)]
pub struct AdjustmentOutcome<E> {
  pub record_id: Uuid,
  pub result:    Result<BehaviourRecord, E>,
}

/// Abstraction over a warden custody store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CustodyStore: Send + Sync {
  type Error: StoreError;

  // ── Facilities ────────────────────────────────────────────────────────

  /// Create a facility. Requires global scope.
  fn create_facility(
    &self,
    scope: Scope,
    input: NewFacility,
  ) -> impl Future<Output = Result<Facility, Self::Error>> + Send + '_;

  fn get_facility(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Facility, Self::Error>> + Send + '_;

  /// Facilities visible to `scope`.
  fn list_facilities(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<Facility>, Self::Error>> + Send + '_;

  /// Rename, resize, or (de)activate a facility. A capacity below the current
  /// active population is rejected with `CapacityExceeded`.
  fn update_facility(
    &self,
    scope: Scope,
    id: Uuid,
    update: FacilityUpdate,
  ) -> impl Future<Output = Result<Facility, Self::Error>> + Send + '_;

  /// Number of `Active` persons currently housed in the facility.
  fn active_count(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  // ── Person lifecycle ──────────────────────────────────────────────────

  /// Admit a new person into a facility with spare capacity.
  fn admit(
    &self,
    scope: Scope,
    input: Admission,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn list_persons(
    &self,
    scope: Scope,
    query: PersonQuery,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn amend_person(
    &self,
    scope: Scope,
    id: Uuid,
    amendment: PersonAmendment,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Move an active person to `target`. `scope` must cover the source
  /// facility; `target` must have spare capacity.
  fn transfer(
    &self,
    scope: Scope,
    id: Uuid,
    target: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn release(
    &self,
    scope: Scope,
    id: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn decease(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Completed transfers for a person, oldest first.
  fn transfer_history(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<TransferRecord>, Self::Error>> + Send + '_;

  // ── Behaviour & sentence adjustment ───────────────────────────────────

  /// Record behaviour for an active person. A non-zero adjustment makes the
  /// record `Pending`.
  fn record_behaviour(
    &self,
    scope: Scope,
    input: NewBehaviourRecord,
  ) -> impl Future<Output = Result<BehaviourRecord, Self::Error>> + Send + '_;

  fn get_behaviour(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<BehaviourRecord, Self::Error>> + Send + '_;

  fn list_behaviours(
    &self,
    scope: Scope,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BehaviourRecord>, Self::Error>> + Send + '_;

  /// Approve a pending adjustment and shift the person's expected release
  /// date, atomically. A second approval fails with `InvalidTransition`.
  fn approve_adjustment(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<BehaviourRecord, Self::Error>> + Send + '_;

  fn reject_adjustment(
    &self,
    scope: Scope,
    id: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<BehaviourRecord, Self::Error>> + Send + '_;

  /// Approve each record independently, one transaction per record. A
  /// failing record does not block the others.
  fn approve_adjustments(
    &self,
    scope: Scope,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Vec<AdjustmentOutcome<Self::Error>>> + Send + '_;

  // ── Work & payment ────────────────────────────────────────────────────

  fn record_work(
    &self,
    scope: Scope,
    input: NewWorkRecord,
  ) -> impl Future<Output = Result<WorkRecord, Self::Error>> + Send + '_;

  /// Edit a pending work record. Paid records are rejected.
  fn update_work(
    &self,
    scope: Scope,
    id: Uuid,
    update: WorkUpdate,
  ) -> impl Future<Output = Result<WorkRecord, Self::Error>> + Send + '_;

  /// Delete a pending work record. Paid records are rejected.
  fn delete_work(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The single action that moves a work record to `Paid`.
  fn approve_payment(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<WorkRecord, Self::Error>> + Send + '_;

  fn list_work(
    &self,
    scope: Scope,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Vec<WorkRecord>, Self::Error>> + Send + '_;

  // ── Visitors & visits ─────────────────────────────────────────────────

  fn register_visitor(
    &self,
    input: NewVisitor,
  ) -> impl Future<Output = Result<Visitor, Self::Error>> + Send + '_;

  fn get_visitor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Visitor, Self::Error>> + Send + '_;

  /// Book a visit for an active person. Overlapping scheduled visits for the
  /// same person are rejected with `Conflict`.
  fn schedule_visit(
    &self,
    scope: Scope,
    input: NewVisit,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  /// Move a scheduled visit. The visit's own current slot is ignored by the
  /// overlap check.
  fn reschedule_visit(
    &self,
    scope: Scope,
    id: Uuid,
    window: VisitWindow,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  fn complete_visit(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  fn cancel_visit(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  fn list_visits(
    &self,
    scope: Scope,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + '_;

  /// Whether `window` clashes with any other scheduled visit of the person.
  fn has_visit_conflict(
    &self,
    scope: Scope,
    person_id: Uuid,
    window: VisitWindow,
    exclude: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
