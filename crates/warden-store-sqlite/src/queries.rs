//! Row-level reads and writes, run synchronously on the connection thread.
//!
//! Every function takes a plain [`Connection`]; inside a unit of work that is
//! the open [`rusqlite::Transaction`] (it derefs to `Connection`), so the
//! reads here see exactly what the surrounding write will commit against.

use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode, OptionalExtension as _, params};
use uuid::Uuid;
use warden_core::{
  Entity,
  behaviour::BehaviourRecord,
  facility::Facility,
  person::{Person, PersonStatus, TransferRecord},
  visit::{Visit, Visitor, VisitStatus},
  work::WorkRecord,
};

use crate::{
  Error, Result,
  encode::{
    RawBehaviour, RawFacility, RawPerson, RawTransfer, RawVisit, RawVisitor,
    RawWork, encode_date, encode_dt, encode_time, encode_uuid,
  },
};

/// Translate a UNIQUE violation into a domain `Conflict`; pass anything else
/// through. Pre-checks normally catch duplicates first.
fn conflict_on_unique(err: rusqlite::Error, what: &str) -> Error {
  match &err {
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == ErrorCode::ConstraintViolation
        && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      warden_core::Error::Conflict(format!("{what} already exists")).into()
    }
    _ => err.into(),
  }
}

fn exists(conn: &Connection, sql: &str, value: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(sql, params![value], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

// ─── Facilities ──────────────────────────────────────────────────────────────

pub fn load_facility(conn: &Connection, id: Uuid) -> Result<Facility> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {} FROM facilities WHERE facility_id = ?1",
        RawFacility::COLUMNS
      ),
      params![encode_uuid(id)],
      RawFacility::from_row,
    )
    .optional()?
    .ok_or(warden_core::Error::not_found(Entity::Facility, id))?;
  raw.into_facility()
}

/// All facilities, or just `only` when given.
pub fn list_facilities(conn: &Connection, only: Option<Uuid>) -> Result<Vec<Facility>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM facilities
     WHERE (?1 IS NULL OR facility_id = ?1)
     ORDER BY code",
    RawFacility::COLUMNS
  ))?;
  let raws = stmt
    .query_map(params![only.map(encode_uuid)], RawFacility::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawFacility::into_facility).collect()
}

pub fn insert_facility(conn: &Connection, f: &Facility) -> Result<()> {
  conn
    .execute(
      "INSERT INTO facilities (facility_id, code, name, capacity, active, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(f.facility_id),
        f.code,
        f.name,
        f.capacity,
        f.active,
        encode_dt(f.created_at),
      ],
    )
    .map_err(|e| conflict_on_unique(e, &format!("facility code {:?}", f.code)))?;
  Ok(())
}

pub fn update_facility(conn: &Connection, f: &Facility) -> Result<()> {
  conn.execute(
    "UPDATE facilities SET name = ?2, capacity = ?3, active = ?4
     WHERE facility_id = ?1",
    params![encode_uuid(f.facility_id), f.name, f.capacity, f.active],
  )?;
  Ok(())
}

pub fn facility_code_taken(conn: &Connection, code: &str) -> Result<bool> {
  exists(conn, "SELECT 1 FROM facilities WHERE code = ?1", code)
}

/// Active population of a facility, read from current rows.
pub fn count_active(conn: &Connection, facility_id: Uuid) -> Result<u32> {
  let n: u32 = conn.query_row(
    "SELECT COUNT(*) FROM persons WHERE facility_id = ?1 AND status = ?2",
    params![encode_uuid(facility_id), PersonStatus::Active.as_ref()],
    |r| r.get(0),
  )?;
  Ok(n)
}

// ─── Persons ─────────────────────────────────────────────────────────────────

pub fn load_person(conn: &Connection, id: Uuid) -> Result<Person> {
  let raw = conn
    .query_row(
      &format!("SELECT {} FROM persons WHERE person_id = ?1", RawPerson::COLUMNS),
      params![encode_uuid(id)],
      RawPerson::from_row,
    )
    .optional()?
    .ok_or(warden_core::Error::not_found(Entity::Person, id))?;
  raw.into_person()
}

pub fn national_id_taken(conn: &Connection, national_id: &str) -> Result<bool> {
  exists(conn, "SELECT 1 FROM persons WHERE national_id = ?1", national_id)
}

pub fn case_number_taken(conn: &Connection, case_number: &str) -> Result<bool> {
  exists(conn, "SELECT 1 FROM persons WHERE case_number = ?1", case_number)
}

pub fn list_persons(
  conn: &Connection,
  facility_id: Option<Uuid>,
  status: Option<PersonStatus>,
) -> Result<Vec<Person>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM persons
     WHERE (?1 IS NULL OR facility_id = ?1)
       AND (?2 IS NULL OR status = ?2)
     ORDER BY family_name, given_name",
    RawPerson::COLUMNS
  ))?;
  let raws = stmt
    .query_map(
      params![facility_id.map(encode_uuid), status.map(|s| s.as_ref().to_owned())],
      RawPerson::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPerson::into_person).collect()
}

pub fn insert_person(conn: &Connection, p: &Person) -> Result<()> {
  conn
    .execute(
      &format!(
        "INSERT INTO persons ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        RawPerson::COLUMNS
      ),
      params![
        encode_uuid(p.person_id),
        p.national_id,
        p.case_number,
        p.given_name,
        p.family_name,
        p.status.as_ref(),
        p.facility_id.map(encode_uuid),
        encode_date(p.admission_date),
        p.expected_release_date.map(encode_date),
        p.actual_release_date.map(encode_date),
        p.release_reason,
        encode_dt(p.created_at),
        encode_dt(p.updated_at),
      ],
    )
    .map_err(|e| conflict_on_unique(e, "person with this national id or case number"))?;
  Ok(())
}

/// Write back every mutable column of `p`.
pub fn update_person(conn: &Connection, p: &Person) -> Result<()> {
  conn.execute(
    "UPDATE persons SET
       given_name = ?2, family_name = ?3, status = ?4, facility_id = ?5,
       expected_release_date = ?6, actual_release_date = ?7,
       release_reason = ?8, updated_at = ?9
     WHERE person_id = ?1",
    params![
      encode_uuid(p.person_id),
      p.given_name,
      p.family_name,
      p.status.as_ref(),
      p.facility_id.map(encode_uuid),
      p.expected_release_date.map(encode_date),
      p.actual_release_date.map(encode_date),
      p.release_reason,
      encode_dt(p.updated_at),
    ],
  )?;
  Ok(())
}

pub fn insert_transfer(conn: &Connection, t: &TransferRecord) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO transfers ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      RawTransfer::COLUMNS
    ),
    params![
      encode_uuid(t.transfer_id),
      encode_uuid(t.person_id),
      encode_uuid(t.from_facility_id),
      encode_uuid(t.to_facility_id),
      t.reason,
      encode_dt(t.transferred_at),
    ],
  )?;
  Ok(())
}

pub fn list_transfers(conn: &Connection, person_id: Uuid) -> Result<Vec<TransferRecord>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM transfers WHERE person_id = ?1 ORDER BY transferred_at",
    RawTransfer::COLUMNS
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(person_id)], RawTransfer::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawTransfer::into_transfer).collect()
}

// ─── Behaviour ───────────────────────────────────────────────────────────────

pub fn load_behaviour(conn: &Connection, id: Uuid) -> Result<BehaviourRecord> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {} FROM behaviour_records WHERE record_id = ?1",
        RawBehaviour::COLUMNS
      ),
      params![encode_uuid(id)],
      RawBehaviour::from_row,
    )
    .optional()?
    .ok_or(warden_core::Error::not_found(Entity::BehaviourRecord, id))?;
  raw.into_record()
}

pub fn insert_behaviour(conn: &Connection, r: &BehaviourRecord) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO behaviour_records ({})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
      RawBehaviour::COLUMNS
    ),
    params![
      encode_uuid(r.record_id),
      encode_uuid(r.person_id),
      r.behaviour_type.as_ref(),
      r.severity.as_ref(),
      r.description,
      encode_date(r.incident_date),
      r.sentence_adjustment_days,
      r.adjustment_status.as_ref(),
      r.approved_at.map(encode_dt),
      r.rejected_at.map(encode_dt),
      r.rejection_reason,
      encode_dt(r.recorded_at),
    ],
  )?;
  Ok(())
}

/// Persist a decision on a pending adjustment.
///
/// The `WHERE` clause re-asserts that the row is still pending; zero rows
/// touched means another writer decided it first.
pub fn record_decision(conn: &Connection, r: &BehaviourRecord) -> Result<()> {
  let changed = conn.execute(
    "UPDATE behaviour_records SET
       adjustment_status = ?2, approved_at = ?3, rejected_at = ?4,
       rejection_reason = ?5
     WHERE record_id = ?1 AND adjustment_status = 'pending'",
    params![
      encode_uuid(r.record_id),
      r.adjustment_status.as_ref(),
      r.approved_at.map(encode_dt),
      r.rejected_at.map(encode_dt),
      r.rejection_reason,
    ],
  )?;
  if changed == 0 {
    return Err(
      warden_core::Error::InvalidTransition(format!(
        "behaviour record {} was already decided",
        r.record_id
      ))
      .into(),
    );
  }
  Ok(())
}

pub fn list_behaviours(conn: &Connection, person_id: Uuid) -> Result<Vec<BehaviourRecord>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM behaviour_records WHERE person_id = ?1
     ORDER BY incident_date, recorded_at",
    RawBehaviour::COLUMNS
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(person_id)], RawBehaviour::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawBehaviour::into_record).collect()
}

// ─── Work ────────────────────────────────────────────────────────────────────

pub fn load_work(conn: &Connection, id: Uuid) -> Result<WorkRecord> {
  let raw = conn
    .query_row(
      &format!("SELECT {} FROM work_records WHERE work_id = ?1", RawWork::COLUMNS),
      params![encode_uuid(id)],
      RawWork::from_row,
    )
    .optional()?
    .ok_or(warden_core::Error::not_found(Entity::WorkRecord, id))?;
  raw.into_record()
}

pub fn insert_work(conn: &Connection, w: &WorkRecord) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO work_records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      RawWork::COLUMNS
    ),
    params![
      encode_uuid(w.work_id),
      encode_uuid(w.person_id),
      encode_date(w.work_date),
      w.task,
      w.hours_worked,
      w.payment_cents,
      w.payment_status.as_ref(),
      w.payment_date.map(encode_date),
      encode_dt(w.recorded_at),
    ],
  )?;
  Ok(())
}

/// Write back a work record that was `pending` when it was loaded. Paid rows
/// are never matched.
pub fn update_pending_work(conn: &Connection, w: &WorkRecord) -> Result<()> {
  let changed = conn.execute(
    "UPDATE work_records SET
       work_date = ?2, task = ?3, hours_worked = ?4, payment_cents = ?5,
       payment_status = ?6, payment_date = ?7
     WHERE work_id = ?1 AND payment_status = 'pending'",
    params![
      encode_uuid(w.work_id),
      encode_date(w.work_date),
      w.task,
      w.hours_worked,
      w.payment_cents,
      w.payment_status.as_ref(),
      w.payment_date.map(encode_date),
    ],
  )?;
  if changed == 0 {
    return Err(
      warden_core::Error::InvalidTransition(format!(
        "work record {} is already paid",
        w.work_id
      ))
      .into(),
    );
  }
  Ok(())
}

pub fn delete_pending_work(conn: &Connection, id: Uuid) -> Result<()> {
  let changed = conn.execute(
    "DELETE FROM work_records WHERE work_id = ?1 AND payment_status = 'pending'",
    params![encode_uuid(id)],
  )?;
  if changed == 0 {
    return Err(
      warden_core::Error::InvalidTransition(format!("work record {id} is already paid"))
        .into(),
    );
  }
  Ok(())
}

pub fn list_work(conn: &Connection, person_id: Uuid) -> Result<Vec<WorkRecord>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM work_records WHERE person_id = ?1 ORDER BY work_date, recorded_at",
    RawWork::COLUMNS
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(person_id)], RawWork::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawWork::into_record).collect()
}

// ─── Visitors ────────────────────────────────────────────────────────────────

pub fn load_visitor(conn: &Connection, id: Uuid) -> Result<Visitor> {
  let raw = conn
    .query_row(
      &format!("SELECT {} FROM visitors WHERE visitor_id = ?1", RawVisitor::COLUMNS),
      params![encode_uuid(id)],
      RawVisitor::from_row,
    )
    .optional()?
    .ok_or(warden_core::Error::not_found(Entity::Visitor, id))?;
  raw.into_visitor()
}

pub fn visitor_national_id_taken(conn: &Connection, national_id: &str) -> Result<bool> {
  exists(conn, "SELECT 1 FROM visitors WHERE national_id = ?1", national_id)
}

pub fn insert_visitor(conn: &Connection, v: &Visitor) -> Result<()> {
  conn
    .execute(
      &format!(
        "INSERT INTO visitors ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
        RawVisitor::COLUMNS
      ),
      params![
        encode_uuid(v.visitor_id),
        v.national_id,
        v.full_name,
        v.relationship,
        encode_dt(v.created_at),
      ],
    )
    .map_err(|e| conflict_on_unique(e, "visitor with this national id"))?;
  Ok(())
}

// ─── Visits ──────────────────────────────────────────────────────────────────

pub fn load_visit(conn: &Connection, id: Uuid) -> Result<Visit> {
  let raw = conn
    .query_row(
      &format!("SELECT {} FROM visits WHERE visit_id = ?1", RawVisit::COLUMNS),
      params![encode_uuid(id)],
      RawVisit::from_row,
    )
    .optional()?
    .ok_or(warden_core::Error::not_found(Entity::Visit, id))?;
  raw.into_visit()
}

/// A person's scheduled visits on `date`: the candidate set for overlap
/// detection.
pub fn scheduled_visits_on(
  conn: &Connection,
  person_id: Uuid,
  date: NaiveDate,
) -> Result<Vec<Visit>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM visits
     WHERE person_id = ?1 AND visit_date = ?2 AND status = ?3
     ORDER BY time_start",
    RawVisit::COLUMNS
  ))?;
  let raws = stmt
    .query_map(
      params![
        encode_uuid(person_id),
        encode_date(date),
        VisitStatus::Scheduled.as_ref()
      ],
      RawVisit::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawVisit::into_visit).collect()
}

pub fn insert_visit(conn: &Connection, v: &Visit) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO visits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      RawVisit::COLUMNS
    ),
    params![
      encode_uuid(v.visit_id),
      encode_uuid(v.person_id),
      encode_uuid(v.visitor_id),
      encode_date(v.window.date),
      encode_time(v.window.time_start),
      encode_time(v.window.time_end),
      v.status.as_ref(),
      v.notes,
      encode_dt(v.created_at),
    ],
  )?;
  Ok(())
}

pub fn update_visit(conn: &Connection, v: &Visit) -> Result<()> {
  conn.execute(
    "UPDATE visits SET visit_date = ?2, time_start = ?3, time_end = ?4, status = ?5
     WHERE visit_id = ?1",
    params![
      encode_uuid(v.visit_id),
      encode_date(v.window.date),
      encode_time(v.window.time_start),
      encode_time(v.window.time_end),
      v.status.as_ref(),
    ],
  )?;
  Ok(())
}

pub fn list_visits(conn: &Connection, person_id: Uuid) -> Result<Vec<Visit>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM visits WHERE person_id = ?1 ORDER BY visit_date, time_start",
    RawVisit::COLUMNS
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(person_id)], RawVisit::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawVisit::into_visit).collect()
}
