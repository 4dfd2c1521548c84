//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`
//! and times of day as `HH:MM:SS`, so lexical order matches chronological
//! order. Enums are stored as their snake_case names. UUIDs are stored as
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Row;
use uuid::Uuid;
use warden_core::{
  behaviour::BehaviourRecord,
  facility::Facility,
  person::{Person, TransferRecord},
  visit::{Visit, VisitWindow, Visitor},
  work::WorkRecord,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::Decode(format!("time {s:?}: {e}")))
}

/// Parse a snake_case enum column. `what` names the column for the error.
pub fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

fn decode_opt<T>(
  s: Option<String>,
  f: impl FnOnce(&str) -> Result<T>,
) -> Result<Option<T>> {
  s.as_deref().map(f).transpose()
}

// ─── Facilities ──────────────────────────────────────────────────────────────

pub struct RawFacility {
  pub facility_id: String,
  pub code:        String,
  pub name:        String,
  pub capacity:    i64,
  pub active:      bool,
  pub created_at:  String,
}

impl RawFacility {
  pub const COLUMNS: &'static str =
    "facility_id, code, name, capacity, active, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      facility_id: row.get(0)?,
      code:        row.get(1)?,
      name:        row.get(2)?,
      capacity:    row.get(3)?,
      active:      row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_facility(self) -> Result<Facility> {
    Ok(Facility {
      facility_id: decode_uuid(&self.facility_id)?,
      code:        self.code,
      name:        self.name,
      capacity:    u32::try_from(self.capacity)
        .map_err(|_| Error::Decode(format!("capacity {}", self.capacity)))?,
      active:      self.active,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Persons ─────────────────────────────────────────────────────────────────

pub struct RawPerson {
  pub person_id:             String,
  pub national_id:           String,
  pub case_number:           String,
  pub given_name:            String,
  pub family_name:           String,
  pub status:                String,
  pub facility_id:           Option<String>,
  pub admission_date:        String,
  pub expected_release_date: Option<String>,
  pub actual_release_date:   Option<String>,
  pub release_reason:        Option<String>,
  pub created_at:            String,
  pub updated_at:            String,
}

impl RawPerson {
  pub const COLUMNS: &'static str = "person_id, national_id, case_number, \
     given_name, family_name, status, facility_id, admission_date, \
     expected_release_date, actual_release_date, release_reason, created_at, \
     updated_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:             row.get(0)?,
      national_id:           row.get(1)?,
      case_number:           row.get(2)?,
      given_name:            row.get(3)?,
      family_name:           row.get(4)?,
      status:                row.get(5)?,
      facility_id:           row.get(6)?,
      admission_date:        row.get(7)?,
      expected_release_date: row.get(8)?,
      actual_release_date:   row.get(9)?,
      release_reason:        row.get(10)?,
      created_at:            row.get(11)?,
      updated_at:            row.get(12)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:             decode_uuid(&self.person_id)?,
      national_id:           self.national_id,
      case_number:           self.case_number,
      given_name:            self.given_name,
      family_name:           self.family_name,
      status:                decode_enum("person status", &self.status)?,
      facility_id:           decode_opt(self.facility_id, decode_uuid)?,
      admission_date:        decode_date(&self.admission_date)?,
      expected_release_date: decode_opt(self.expected_release_date, decode_date)?,
      actual_release_date:   decode_opt(self.actual_release_date, decode_date)?,
      release_reason:        self.release_reason,
      created_at:            decode_dt(&self.created_at)?,
      updated_at:            decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawTransfer {
  pub transfer_id:      String,
  pub person_id:        String,
  pub from_facility_id: String,
  pub to_facility_id:   String,
  pub reason:           Option<String>,
  pub transferred_at:   String,
}

impl RawTransfer {
  pub const COLUMNS: &'static str = "transfer_id, person_id, from_facility_id, \
     to_facility_id, reason, transferred_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      transfer_id:      row.get(0)?,
      person_id:        row.get(1)?,
      from_facility_id: row.get(2)?,
      to_facility_id:   row.get(3)?,
      reason:           row.get(4)?,
      transferred_at:   row.get(5)?,
    })
  }

  pub fn into_transfer(self) -> Result<TransferRecord> {
    Ok(TransferRecord {
      transfer_id:      decode_uuid(&self.transfer_id)?,
      person_id:        decode_uuid(&self.person_id)?,
      from_facility_id: decode_uuid(&self.from_facility_id)?,
      to_facility_id:   decode_uuid(&self.to_facility_id)?,
      reason:           self.reason,
      transferred_at:   decode_dt(&self.transferred_at)?,
    })
  }
}

// ─── Behaviour ───────────────────────────────────────────────────────────────

pub struct RawBehaviour {
  pub record_id:                String,
  pub person_id:                String,
  pub behaviour_type:           String,
  pub severity:                 String,
  pub description:              String,
  pub incident_date:            String,
  pub sentence_adjustment_days: i32,
  pub adjustment_status:        String,
  pub approved_at:              Option<String>,
  pub rejected_at:              Option<String>,
  pub rejection_reason:         Option<String>,
  pub recorded_at:              String,
}

impl RawBehaviour {
  pub const COLUMNS: &'static str = "record_id, person_id, behaviour_type, \
     severity, description, incident_date, sentence_adjustment_days, \
     adjustment_status, approved_at, rejected_at, rejection_reason, recorded_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:                row.get(0)?,
      person_id:                row.get(1)?,
      behaviour_type:           row.get(2)?,
      severity:                 row.get(3)?,
      description:              row.get(4)?,
      incident_date:            row.get(5)?,
      sentence_adjustment_days: row.get(6)?,
      adjustment_status:        row.get(7)?,
      approved_at:              row.get(8)?,
      rejected_at:              row.get(9)?,
      rejection_reason:         row.get(10)?,
      recorded_at:              row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<BehaviourRecord> {
    Ok(BehaviourRecord {
      record_id:                decode_uuid(&self.record_id)?,
      person_id:                decode_uuid(&self.person_id)?,
      behaviour_type:           decode_enum("behaviour type", &self.behaviour_type)?,
      severity:                 decode_enum("severity", &self.severity)?,
      description:              self.description,
      incident_date:            decode_date(&self.incident_date)?,
      sentence_adjustment_days: self.sentence_adjustment_days,
      adjustment_status:        decode_enum(
        "adjustment status",
        &self.adjustment_status,
      )?,
      approved_at:              decode_opt(self.approved_at, decode_dt)?,
      rejected_at:              decode_opt(self.rejected_at, decode_dt)?,
      rejection_reason:         self.rejection_reason,
      recorded_at:              decode_dt(&self.recorded_at)?,
    })
  }
}

// ─── Work ────────────────────────────────────────────────────────────────────

pub struct RawWork {
  pub work_id:        String,
  pub person_id:      String,
  pub work_date:      String,
  pub task:           String,
  pub hours_worked:   f64,
  pub payment_cents:  i64,
  pub payment_status: String,
  pub payment_date:   Option<String>,
  pub recorded_at:    String,
}

impl RawWork {
  pub const COLUMNS: &'static str = "work_id, person_id, work_date, task, \
     hours_worked, payment_cents, payment_status, payment_date, recorded_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      work_id:        row.get(0)?,
      person_id:      row.get(1)?,
      work_date:      row.get(2)?,
      task:           row.get(3)?,
      hours_worked:   row.get(4)?,
      payment_cents:  row.get(5)?,
      payment_status: row.get(6)?,
      payment_date:   row.get(7)?,
      recorded_at:    row.get(8)?,
    })
  }

  pub fn into_record(self) -> Result<WorkRecord> {
    Ok(WorkRecord {
      work_id:        decode_uuid(&self.work_id)?,
      person_id:      decode_uuid(&self.person_id)?,
      work_date:      decode_date(&self.work_date)?,
      task:           self.task,
      hours_worked:   self.hours_worked,
      payment_cents:  self.payment_cents,
      payment_status: decode_enum("payment status", &self.payment_status)?,
      payment_date:   decode_opt(self.payment_date, decode_date)?,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}

// ─── Visitors & visits ───────────────────────────────────────────────────────

pub struct RawVisitor {
  pub visitor_id:   String,
  pub national_id:  String,
  pub full_name:    String,
  pub relationship: Option<String>,
  pub created_at:   String,
}

impl RawVisitor {
  pub const COLUMNS: &'static str =
    "visitor_id, national_id, full_name, relationship, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      visitor_id:   row.get(0)?,
      national_id:  row.get(1)?,
      full_name:    row.get(2)?,
      relationship: row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_visitor(self) -> Result<Visitor> {
    Ok(Visitor {
      visitor_id:   decode_uuid(&self.visitor_id)?,
      national_id:  self.national_id,
      full_name:    self.full_name,
      relationship: self.relationship,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawVisit {
  pub visit_id:   String,
  pub person_id:  String,
  pub visitor_id: String,
  pub visit_date: String,
  pub time_start: String,
  pub time_end:   String,
  pub status:     String,
  pub notes:      Option<String>,
  pub created_at: String,
}

impl RawVisit {
  pub const COLUMNS: &'static str = "visit_id, person_id, visitor_id, \
     visit_date, time_start, time_end, status, notes, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      visit_id:   row.get(0)?,
      person_id:  row.get(1)?,
      visitor_id: row.get(2)?,
      visit_date: row.get(3)?,
      time_start: row.get(4)?,
      time_end:   row.get(5)?,
      status:     row.get(6)?,
      notes:      row.get(7)?,
      created_at: row.get(8)?,
    })
  }

  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      visit_id:   decode_uuid(&self.visit_id)?,
      person_id:  decode_uuid(&self.person_id)?,
      visitor_id: decode_uuid(&self.visitor_id)?,
      window:     VisitWindow {
        date:       decode_date(&self.visit_date)?,
        time_start: decode_time(&self.time_start)?,
        time_end:   decode_time(&self.time_end)?,
      },
      status:     decode_enum("visit status", &self.status)?,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
