//! SQL schema for the warden SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS facilities (
    facility_id TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    capacity    INTEGER NOT NULL CHECK (capacity >= 0),
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    person_id             TEXT PRIMARY KEY,
    national_id           TEXT NOT NULL UNIQUE,
    case_number           TEXT NOT NULL UNIQUE,
    given_name            TEXT NOT NULL,
    family_name           TEXT NOT NULL,
    status                TEXT NOT NULL,   -- 'active' | 'released' | 'transferred' | 'deceased'
    facility_id           TEXT REFERENCES facilities(facility_id),
    admission_date        TEXT NOT NULL,   -- YYYY-MM-DD
    expected_release_date TEXT,
    actual_release_date   TEXT,
    release_reason        TEXT,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    CHECK (status != 'active' OR facility_id IS NOT NULL)
);

-- One row per completed move; never updated.
CREATE TABLE IF NOT EXISTS transfers (
    transfer_id      TEXT PRIMARY KEY,
    person_id        TEXT NOT NULL REFERENCES persons(person_id),
    from_facility_id TEXT NOT NULL REFERENCES facilities(facility_id),
    to_facility_id   TEXT NOT NULL REFERENCES facilities(facility_id),
    reason           TEXT,
    transferred_at   TEXT NOT NULL,
    CHECK (from_facility_id != to_facility_id)
);

CREATE TABLE IF NOT EXISTS behaviour_records (
    record_id                TEXT PRIMARY KEY,
    person_id                TEXT NOT NULL REFERENCES persons(person_id),
    behaviour_type           TEXT NOT NULL,   -- 'positive' | 'negative'
    severity                 TEXT NOT NULL,   -- 'minor' | 'moderate' | 'severe'
    description              TEXT NOT NULL,
    incident_date            TEXT NOT NULL,
    sentence_adjustment_days INTEGER NOT NULL DEFAULT 0,
    adjustment_status        TEXT NOT NULL,
    approved_at              TEXT,
    rejected_at              TEXT,
    rejection_reason         TEXT,
    recorded_at              TEXT NOT NULL,
    CHECK (behaviour_type != 'positive' OR sentence_adjustment_days <= 0),
    CHECK (behaviour_type != 'negative' OR sentence_adjustment_days >= 0)
);

CREATE TABLE IF NOT EXISTS work_records (
    work_id        TEXT PRIMARY KEY,
    person_id      TEXT NOT NULL REFERENCES persons(person_id),
    work_date      TEXT NOT NULL,
    task           TEXT NOT NULL,
    hours_worked   REAL NOT NULL,
    payment_cents  INTEGER NOT NULL CHECK (payment_cents >= 0),
    payment_status TEXT NOT NULL,   -- 'pending' | 'paid'
    payment_date   TEXT,
    recorded_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS visitors (
    visitor_id   TEXT PRIMARY KEY,
    national_id  TEXT NOT NULL UNIQUE,
    full_name    TEXT NOT NULL,
    relationship TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS visits (
    visit_id   TEXT PRIMARY KEY,
    person_id  TEXT NOT NULL REFERENCES persons(person_id),
    visitor_id TEXT NOT NULL REFERENCES visitors(visitor_id),
    visit_date TEXT NOT NULL,   -- YYYY-MM-DD
    time_start TEXT NOT NULL,   -- HH:MM:SS
    time_end   TEXT NOT NULL,
    status     TEXT NOT NULL,   -- 'scheduled' | 'completed' | 'cancelled'
    notes      TEXT,
    created_at TEXT NOT NULL,
    CHECK (time_end > time_start)
);

CREATE INDEX IF NOT EXISTS persons_facility_status_idx ON persons(facility_id, status);
CREATE INDEX IF NOT EXISTS transfers_person_idx        ON transfers(person_id);
CREATE INDEX IF NOT EXISTS behaviour_person_idx        ON behaviour_records(person_id);
CREATE INDEX IF NOT EXISTS work_person_idx             ON work_records(person_id);
CREATE INDEX IF NOT EXISTS visits_person_date_idx      ON visits(person_id, visit_date);

PRAGMA user_version = 1;
";
