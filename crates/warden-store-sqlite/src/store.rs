//! [`SqliteStore`]: the SQLite implementation of [`CustodyStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use uuid::Uuid;

use warden_core::{
  Scope, adjustment,
  behaviour::{BehaviourRecord, NewBehaviourRecord},
  capacity,
  facility::{Facility, FacilityUpdate, NewFacility},
  person::{Admission, Person, PersonAmendment, PersonQuery, TransferRecord},
  schedule,
  store::{AdjustmentOutcome, CustodyStore},
  visit::{NewVisit, NewVisitor, Visit, VisitWindow, Visitor},
  work::{NewWorkRecord, WorkRecord, WorkUpdate},
};

use crate::{Error, Result, queries as q, schema::SCHEMA};

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A warden custody store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` as one unit of work inside a `BEGIN IMMEDIATE` transaction.
  ///
  /// The write lock is taken before `f` reads anything, so the counts and
  /// statuses it checks cannot change under it. `f` receives the transaction
  /// start time. An `Err` from `f` drops the transaction, rolling it back.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Transaction<'_>, DateTime<Utc>) -> Result<T>
      + Send
      + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = f(&tx, Utc::now());
        match outcome {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(e) => Ok(Err(e)),
        }
      })
      .await?
  }

  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

/// Check `scope` against the facility a person belongs to. Persons who were
/// never housed anywhere are visible to global callers only.
fn require_person(scope: Scope, person: &Person) -> Result<()> {
  match person.facility_id {
    Some(facility_id) => scope.require(facility_id)?,
    None => scope.require_global("access an unhoused person")?,
  }
  Ok(())
}

/// Load a person and check it is within `scope`.
fn scoped_person(
  conn: &rusqlite::Connection,
  scope: Scope,
  id: Uuid,
) -> Result<Person> {
  let person = q::load_person(conn, id)?;
  require_person(scope, &person)?;
  Ok(person)
}

/// Reject `window` if it clashes with another scheduled visit of the person.
fn ensure_no_overlap(
  conn: &rusqlite::Connection,
  person_id: Uuid,
  window: &VisitWindow,
  exclude: Option<Uuid>,
) -> Result<()> {
  let existing = q::scheduled_visits_on(conn, person_id, window.date)?;
  if let Some(clash) = schedule::find_conflict(window, &existing, exclude) {
    return Err(
      warden_core::Error::Conflict(format!(
        "visit overlaps scheduled visit {} ({} – {})",
        clash.visit_id, clash.window.time_start, clash.window.time_end
      ))
      .into(),
    );
  }
  Ok(())
}

// ─── CustodyStore impl ───────────────────────────────────────────────────────

impl CustodyStore for SqliteStore {
  type Error = Error;

  // ── Facilities ──────────────────────────────────────────────────────────

  async fn create_facility(&self, scope: Scope, input: NewFacility) -> Result<Facility> {
    self
      .write(move |tx, now| {
        scope.require_global("create facility")?;
        if q::facility_code_taken(tx, &input.code)? {
          return Err(
            warden_core::Error::Conflict(format!(
              "facility code {:?} already exists",
              input.code
            ))
            .into(),
          );
        }

        let facility = Facility {
          facility_id: Uuid::new_v4(),
          code:        input.code,
          name:        input.name,
          capacity:    input.capacity,
          active:      true,
          created_at:  now,
        };
        q::insert_facility(tx, &facility)?;
        Ok(facility)
      })
      .await
  }

  async fn get_facility(&self, scope: Scope, id: Uuid) -> Result<Facility> {
    self
      .read(move |conn| {
        let facility = q::load_facility(conn, id)?;
        scope.require(facility.facility_id)?;
        Ok(facility)
      })
      .await
  }

  async fn list_facilities(&self, scope: Scope) -> Result<Vec<Facility>> {
    self
      .read(move |conn| match scope {
        Scope::Global => q::list_facilities(conn, None),
        Scope::Facility(own) => q::list_facilities(conn, Some(own)),
        Scope::Unassigned => Ok(Vec::new()),
      })
      .await
  }

  async fn update_facility(
    &self,
    scope: Scope,
    id: Uuid,
    update: FacilityUpdate,
  ) -> Result<Facility> {
    self
      .write(move |tx, _now| {
        let mut facility = q::load_facility(tx, id)?;
        scope.require(facility.facility_id)?;
        let active = q::count_active(tx, id)?;
        capacity::apply_update(&mut facility, update, active)?;
        q::update_facility(tx, &facility)?;
        Ok(facility)
      })
      .await
  }

  async fn active_count(&self, scope: Scope, id: Uuid) -> Result<u32> {
    self
      .read(move |conn| {
        q::load_facility(conn, id)?;
        scope.require(id)?;
        q::count_active(conn, id)
      })
      .await
  }

  // ── Person lifecycle ────────────────────────────────────────────────────

  async fn admit(&self, scope: Scope, input: Admission) -> Result<Person> {
    self
      .write(move |tx, now| {
        scope.require(input.facility_id)?;
        let facility = q::load_facility(tx, input.facility_id)?;

        if q::national_id_taken(tx, &input.national_id)? {
          return Err(
            warden_core::Error::Conflict(format!(
              "a person with national id {:?} already exists",
              input.national_id
            ))
            .into(),
          );
        }
        if q::case_number_taken(tx, &input.case_number)? {
          return Err(
            warden_core::Error::Conflict(format!(
              "a person with case number {:?} already exists",
              input.case_number
            ))
            .into(),
          );
        }

        let person = Person::admitted(input, now)?;
        capacity::check_admission(&facility, q::count_active(tx, facility.facility_id)?)?;
        q::insert_person(tx, &person)?;
        Ok(person)
      })
      .await
  }

  async fn get_person(&self, scope: Scope, id: Uuid) -> Result<Person> {
    self.read(move |conn| scoped_person(conn, scope, id)).await
  }

  async fn list_persons(&self, scope: Scope, query: PersonQuery) -> Result<Vec<Person>> {
    self
      .read(move |conn| {
        let facility_id = match (scope, query.facility_id) {
          (Scope::Global, wanted) => wanted,
          (Scope::Facility(own), None) => Some(own),
          (Scope::Facility(_), Some(wanted)) => {
            scope.require(wanted)?;
            Some(wanted)
          }
          (Scope::Unassigned, _) => return Ok(Vec::new()),
        };
        q::list_persons(conn, facility_id, query.status)
      })
      .await
  }

  async fn amend_person(
    &self,
    scope: Scope,
    id: Uuid,
    amendment: PersonAmendment,
  ) -> Result<Person> {
    self
      .write(move |tx, now| {
        let mut person = scoped_person(tx, scope, id)?;
        person.amend(amendment, now)?;
        q::update_person(tx, &person)?;
        Ok(person)
      })
      .await
  }

  async fn transfer(
    &self,
    scope: Scope,
    id: Uuid,
    target: Uuid,
    reason: Option<String>,
  ) -> Result<Person> {
    self
      .write(move |tx, now| {
        let mut person = q::load_person(tx, id)?;
        scope.require(person.current_facility()?)?;
        let target_facility = q::load_facility(tx, target)?;

        let source = person.transfer_to(target, now)?;
        capacity::check_transfer(&target_facility, q::count_active(tx, target)?)?;

        q::update_person(tx, &person)?;
        q::insert_transfer(tx, &TransferRecord {
          transfer_id: Uuid::new_v4(),
          person_id: person.person_id,
          from_facility_id: source,
          to_facility_id: target,
          reason,
          transferred_at: now,
        })?;
        Ok(person)
      })
      .await
  }

  async fn release(&self, scope: Scope, id: Uuid, reason: Option<String>) -> Result<Person> {
    self
      .write(move |tx, now| {
        let mut person = scoped_person(tx, scope, id)?;
        person.release(reason, now)?;
        q::update_person(tx, &person)?;
        Ok(person)
      })
      .await
  }

  async fn decease(&self, scope: Scope, id: Uuid) -> Result<Person> {
    self
      .write(move |tx, now| {
        let mut person = scoped_person(tx, scope, id)?;
        person.decease(now)?;
        q::update_person(tx, &person)?;
        Ok(person)
      })
      .await
  }

  async fn transfer_history(&self, scope: Scope, id: Uuid) -> Result<Vec<TransferRecord>> {
    self
      .read(move |conn| {
        scoped_person(conn, scope, id)?;
        q::list_transfers(conn, id)
      })
      .await
  }

  // ── Behaviour & sentence adjustment ─────────────────────────────────────

  async fn record_behaviour(
    &self,
    scope: Scope,
    input: NewBehaviourRecord,
  ) -> Result<BehaviourRecord> {
    self
      .write(move |tx, now| {
        let person = scoped_person(tx, scope, input.person_id)?;
        person.ensure_active("record behaviour")?;
        let record = input.into_record(now)?;
        q::insert_behaviour(tx, &record)?;
        Ok(record)
      })
      .await
  }

  async fn get_behaviour(&self, scope: Scope, id: Uuid) -> Result<BehaviourRecord> {
    self
      .read(move |conn| {
        let record = q::load_behaviour(conn, id)?;
        scoped_person(conn, scope, record.person_id)?;
        Ok(record)
      })
      .await
  }

  async fn list_behaviours(
    &self,
    scope: Scope,
    person_id: Uuid,
  ) -> Result<Vec<BehaviourRecord>> {
    self
      .read(move |conn| {
        scoped_person(conn, scope, person_id)?;
        q::list_behaviours(conn, person_id)
      })
      .await
  }

  async fn approve_adjustment(&self, scope: Scope, id: Uuid) -> Result<BehaviourRecord> {
    self
      .write(move |tx, now| {
        let mut record = q::load_behaviour(tx, id)?;
        let mut person = scoped_person(tx, scope, record.person_id)?;
        adjustment::approve(&mut record, &mut person, now)?;
        q::record_decision(tx, &record)?;
        q::update_person(tx, &person)?;
        Ok(record)
      })
      .await
  }

  async fn reject_adjustment(
    &self,
    scope: Scope,
    id: Uuid,
    reason: Option<String>,
  ) -> Result<BehaviourRecord> {
    self
      .write(move |tx, now| {
        let mut record = q::load_behaviour(tx, id)?;
        scoped_person(tx, scope, record.person_id)?;
        record.reject(reason, now)?;
        q::record_decision(tx, &record)?;
        Ok(record)
      })
      .await
  }

  async fn approve_adjustments(
    &self,
    scope: Scope,
    ids: Vec<Uuid>,
  ) -> Vec<AdjustmentOutcome<Error>> {
    let mut outcomes = Vec::with_capacity(ids.len());
    for record_id in ids {
      let result = self.approve_adjustment(scope, record_id).await;
      outcomes.push(AdjustmentOutcome { record_id, result });
    }
    outcomes
  }

  // ── Work & payment ──────────────────────────────────────────────────────

  async fn record_work(&self, scope: Scope, input: NewWorkRecord) -> Result<WorkRecord> {
    self
      .write(move |tx, now| {
        let person = scoped_person(tx, scope, input.person_id)?;
        person.ensure_active("record work")?;
        let record = input.into_record(now)?;
        q::insert_work(tx, &record)?;
        Ok(record)
      })
      .await
  }

  async fn update_work(
    &self,
    scope: Scope,
    id: Uuid,
    update: WorkUpdate,
  ) -> Result<WorkRecord> {
    self
      .write(move |tx, _now| {
        let mut record = q::load_work(tx, id)?;
        scoped_person(tx, scope, record.person_id)?;
        record.apply(update)?;
        q::update_pending_work(tx, &record)?;
        Ok(record)
      })
      .await
  }

  async fn delete_work(&self, scope: Scope, id: Uuid) -> Result<()> {
    self
      .write(move |tx, _now| {
        let record = q::load_work(tx, id)?;
        scoped_person(tx, scope, record.person_id)?;
        record.ensure_editable("delete")?;
        q::delete_pending_work(tx, id)
      })
      .await
  }

  async fn approve_payment(&self, scope: Scope, id: Uuid) -> Result<WorkRecord> {
    self
      .write(move |tx, now| {
        let mut record = q::load_work(tx, id)?;
        scoped_person(tx, scope, record.person_id)?;
        record.mark_paid(now.date_naive())?;
        q::update_pending_work(tx, &record)?;
        Ok(record)
      })
      .await
  }

  async fn list_work(&self, scope: Scope, person_id: Uuid) -> Result<Vec<WorkRecord>> {
    self
      .read(move |conn| {
        scoped_person(conn, scope, person_id)?;
        q::list_work(conn, person_id)
      })
      .await
  }

  // ── Visitors & visits ───────────────────────────────────────────────────

  async fn register_visitor(&self, input: NewVisitor) -> Result<Visitor> {
    self
      .write(move |tx, now| {
        if q::visitor_national_id_taken(tx, &input.national_id)? {
          return Err(
            warden_core::Error::Conflict(format!(
              "a visitor with national id {:?} already exists",
              input.national_id
            ))
            .into(),
          );
        }
        let visitor = Visitor {
          visitor_id:   Uuid::new_v4(),
          national_id:  input.national_id,
          full_name:    input.full_name,
          relationship: input.relationship,
          created_at:   now,
        };
        q::insert_visitor(tx, &visitor)?;
        Ok(visitor)
      })
      .await
  }

  async fn get_visitor(&self, id: Uuid) -> Result<Visitor> {
    self.read(move |conn| q::load_visitor(conn, id)).await
  }

  async fn schedule_visit(&self, scope: Scope, input: NewVisit) -> Result<Visit> {
    self
      .write(move |tx, now| {
        let person = scoped_person(tx, scope, input.person_id)?;
        person.ensure_active("schedule a visit")?;
        q::load_visitor(tx, input.visitor_id)?;

        let visit = input.into_visit(now)?;
        ensure_no_overlap(tx, visit.person_id, &visit.window, None)?;
        q::insert_visit(tx, &visit)?;
        Ok(visit)
      })
      .await
  }

  async fn reschedule_visit(
    &self,
    scope: Scope,
    id: Uuid,
    window: VisitWindow,
  ) -> Result<Visit> {
    self
      .write(move |tx, _now| {
        let mut visit = q::load_visit(tx, id)?;
        let person = scoped_person(tx, scope, visit.person_id)?;
        person.ensure_active("reschedule a visit")?;

        visit.reschedule(window)?;
        ensure_no_overlap(tx, visit.person_id, &visit.window, Some(visit.visit_id))?;
        q::update_visit(tx, &visit)?;
        Ok(visit)
      })
      .await
  }

  async fn complete_visit(&self, scope: Scope, id: Uuid) -> Result<Visit> {
    self
      .write(move |tx, _now| {
        let mut visit = q::load_visit(tx, id)?;
        scoped_person(tx, scope, visit.person_id)?;
        visit.complete()?;
        q::update_visit(tx, &visit)?;
        Ok(visit)
      })
      .await
  }

  async fn cancel_visit(&self, scope: Scope, id: Uuid) -> Result<Visit> {
    self
      .write(move |tx, _now| {
        let mut visit = q::load_visit(tx, id)?;
        scoped_person(tx, scope, visit.person_id)?;
        visit.cancel()?;
        q::update_visit(tx, &visit)?;
        Ok(visit)
      })
      .await
  }

  async fn list_visits(&self, scope: Scope, person_id: Uuid) -> Result<Vec<Visit>> {
    self
      .read(move |conn| {
        scoped_person(conn, scope, person_id)?;
        q::list_visits(conn, person_id)
      })
      .await
  }

  async fn has_visit_conflict(
    &self,
    scope: Scope,
    person_id: Uuid,
    window: VisitWindow,
    exclude: Option<Uuid>,
  ) -> Result<bool> {
    self
      .read(move |conn| {
        scoped_person(conn, scope, person_id)?;
        let existing = q::scheduled_visits_on(conn, person_id, window.date)?;
        Ok(schedule::find_conflict(&window, &existing, exclude).is_some())
      })
      .await
  }
}
