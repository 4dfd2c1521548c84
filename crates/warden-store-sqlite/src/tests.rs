//! Integration tests for `SqliteStore`.
//!
//! Most tests run against an in-memory database. The concurrency tests open
//! two independent connections to one database file so their transactions
//! genuinely race.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime, TimeDelta, Utc};
use uuid::Uuid;
use warden_core::{
  Error as CoreError, Scope,
  behaviour::{AdjustmentStatus, BehaviourType, NewBehaviourRecord, Severity},
  facility::{Facility, FacilityUpdate, NewFacility},
  person::{Admission, Person, PersonAmendment, PersonQuery, PersonStatus},
  store::{CustodyStore, StoreError},
  visit::{NewVisit, NewVisitor, Visit, VisitStatus, VisitWindow, Visitor},
  work::{NewWorkRecord, PaymentStatus, WorkUpdate},
};

use crate::{Error, SqliteStore};

const G: Scope = Scope::Global;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn domain(err: &Error) -> &CoreError {
  err.domain().unwrap_or_else(|| panic!("expected a domain error, got {err}"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn window(d: NaiveDate, start: (u32, u32), end: (u32, u32)) -> VisitWindow {
  VisitWindow {
    date:       d,
    time_start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
    time_end:   NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
  }
}

async fn facility(s: &SqliteStore, capacity: u32) -> Facility {
  let tag = Uuid::new_v4().simple().to_string();
  s.create_facility(G, NewFacility {
    code: format!("F-{}", &tag[..8]),
    name: "North Block".into(),
    capacity,
  })
  .await
  .unwrap()
}

fn admission(facility_id: Uuid) -> Admission {
  let tag = Uuid::new_v4().simple().to_string();
  Admission {
    national_id: format!("NID-{tag}"),
    case_number: format!("CASE-{tag}"),
    given_name: "Ada".into(),
    family_name: "Moreau".into(),
    facility_id,
    admission_date: Some(date(2024, 1, 15)),
    expected_release_date: Some(date(2025, 6, 1)),
  }
}

async fn person(s: &SqliteStore, facility_id: Uuid) -> Person {
  s.admit(G, admission(facility_id)).await.unwrap()
}

fn behaviour(person_id: Uuid, kind: BehaviourType, days: i32) -> NewBehaviourRecord {
  NewBehaviourRecord {
    person_id,
    behaviour_type: kind,
    severity: Severity::Moderate,
    description: "kitchen duty".into(),
    incident_date: date(2025, 1, 3),
    sentence_adjustment_days: days,
  }
}

async fn visitor(s: &SqliteStore) -> Visitor {
  s.register_visitor(NewVisitor {
    national_id:  format!("V-{}", Uuid::new_v4().simple()),
    full_name:    "Lena Moreau".into(),
    relationship: Some("sister".into()),
  })
  .await
  .unwrap()
}

async fn book(
  s: &SqliteStore,
  person_id: Uuid,
  visitor_id: Uuid,
  w: VisitWindow,
) -> crate::Result<Visit> {
  s.schedule_visit(G, NewVisit {
    person_id,
    visitor_id,
    window: w,
    notes: None,
  })
  .await
}

// ─── Facilities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_facility_requires_global_scope() {
  let s = store().await;
  let f = facility(&s, 5).await;
  assert!(f.active);

  let err = s
    .create_facility(Scope::Facility(f.facility_id), NewFacility {
      code:     "SOUTH".into(),
      name:     "South".into(),
      capacity: 5,
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Forbidden(_)));
}

#[tokio::test]
async fn duplicate_facility_code_conflicts() {
  let s = store().await;
  let f = facility(&s, 5).await;
  let err = s
    .create_facility(G, NewFacility {
      code:     f.code.clone(),
      name:     "Copy".into(),
      capacity: 1,
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Conflict(_)));
}

#[tokio::test]
async fn facility_listing_follows_scope() {
  let s = store().await;
  let a = facility(&s, 5).await;
  let _b = facility(&s, 5).await;

  assert_eq!(s.list_facilities(G).await.unwrap().len(), 2);

  let own = s.list_facilities(Scope::Facility(a.facility_id)).await.unwrap();
  assert_eq!(own, vec![a.clone()]);

  assert!(s.list_facilities(Scope::Unassigned).await.unwrap().is_empty());

  let err = s
    .get_facility(Scope::Unassigned, a.facility_id)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Forbidden(_)));
}

#[tokio::test]
async fn capacity_cannot_drop_below_active_population() {
  let s = store().await;
  let f = facility(&s, 5).await;
  person(&s, f.facility_id).await;
  person(&s, f.facility_id).await;

  let err = s
    .update_facility(G, f.facility_id, FacilityUpdate {
      capacity: Some(1),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(
    domain(&err),
    CoreError::CapacityExceeded { capacity: 1, active: 2, .. }
  ));

  let updated = s
    .update_facility(G, f.facility_id, FacilityUpdate {
      capacity: Some(2),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.capacity, 2);
  assert_eq!(s.get_facility(G, f.facility_id).await.unwrap().capacity, 2);
}

#[tokio::test]
async fn occupied_facility_cannot_be_deactivated() {
  let s = store().await;
  let f = facility(&s, 5).await;
  let p = person(&s, f.facility_id).await;
  let deactivate = FacilityUpdate { active: Some(false), ..Default::default() };

  let err = s
    .update_facility(G, f.facility_id, deactivate.clone())
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));

  s.release(G, p.person_id, None).await.unwrap();
  let closed = s
    .update_facility(G, f.facility_id, deactivate)
    .await
    .unwrap();
  assert!(!closed.active);

  let err = s.admit(G, admission(f.facility_id)).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
}

// ─── Admission ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn admit_creates_active_person() {
  let s = store().await;
  let f = facility(&s, 2).await;

  let today = Utc::now().date_naive();
  let mut input = admission(f.facility_id);
  input.admission_date = None;
  input.expected_release_date = Some(today + TimeDelta::days(365));
  let p = s.admit(G, input).await.unwrap();

  assert_eq!(p.status, PersonStatus::Active);
  assert_eq!(p.facility_id, Some(f.facility_id));
  assert_eq!(p.admission_date, today);
  assert_eq!(s.get_person(G, p.person_id).await.unwrap(), p);
  assert_eq!(s.active_count(G, f.facility_id).await.unwrap(), 1);
}

#[tokio::test]
async fn admission_into_full_facility_is_rejected() {
  let s = store().await;
  let f = facility(&s, 1).await;
  person(&s, f.facility_id).await;

  let err = s.admit(G, admission(f.facility_id)).await.unwrap_err();
  assert_eq!(domain(&err), &CoreError::CapacityExceeded {
    facility_id: f.facility_id,
    capacity:    1,
    active:      1,
  });
  assert_eq!(s.active_count(G, f.facility_id).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_identifiers_conflict() {
  let s = store().await;
  let f = facility(&s, 5).await;
  let p = person(&s, f.facility_id).await;

  let mut same_nid = admission(f.facility_id);
  same_nid.national_id = p.national_id.clone();
  let err = s.admit(G, same_nid).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Conflict(_)));

  let mut same_case = admission(f.facility_id);
  same_case.case_number = p.case_number.clone();
  let err = s.admit(G, same_case).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Conflict(_)));
}

#[tokio::test]
async fn admission_outside_scope_is_forbidden() {
  let s = store().await;
  let a = facility(&s, 5).await;
  let b = facility(&s, 5).await;

  let err = s
    .admit(Scope::Facility(b.facility_id), admission(a.facility_id))
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Forbidden(_)));

  let err = s
    .admit(Scope::Unassigned, admission(a.facility_id))
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Forbidden(_)));

  s.admit(Scope::Facility(a.facility_id), admission(a.facility_id))
    .await
    .unwrap();
}

#[tokio::test]
async fn admission_into_unknown_facility_is_not_found() {
  let s = store().await;
  let err = s.admit(G, admission(Uuid::new_v4())).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { .. }));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn transfer_moves_person_and_records_history() {
  let s = store().await;
  let a = facility(&s, 5).await;
  let b = facility(&s, 5).await;
  let p = person(&s, a.facility_id).await;

  let moved = s
    .transfer(
      Scope::Facility(a.facility_id),
      p.person_id,
      b.facility_id,
      Some("court order".into()),
    )
    .await
    .unwrap();
  assert_eq!(moved.status, PersonStatus::Active);
  assert_eq!(moved.facility_id, Some(b.facility_id));
  assert_eq!(s.active_count(G, a.facility_id).await.unwrap(), 0);
  assert_eq!(s.active_count(G, b.facility_id).await.unwrap(), 1);

  let history = s.transfer_history(G, p.person_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].from_facility_id, a.facility_id);
  assert_eq!(history[0].to_facility_id, b.facility_id);
  assert_eq!(history[0].reason.as_deref(), Some("court order"));
}

#[tokio::test]
async fn transfer_into_full_facility_leaves_person_in_place() {
  let s = store().await;
  let a = facility(&s, 5).await;
  let b = facility(&s, 1).await;
  let p = person(&s, a.facility_id).await;
  person(&s, b.facility_id).await;

  let err = s
    .transfer(G, p.person_id, b.facility_id, None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::CapacityExceeded { .. }));

  let unchanged = s.get_person(G, p.person_id).await.unwrap();
  assert_eq!(unchanged.facility_id, Some(a.facility_id));
  assert!(s.transfer_history(G, p.person_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn transfer_requires_scope_over_source() {
  let s = store().await;
  let a = facility(&s, 5).await;
  let b = facility(&s, 5).await;
  let p = person(&s, a.facility_id).await;

  let err = s
    .transfer(Scope::Facility(b.facility_id), p.person_id, b.facility_id, None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Forbidden(_)));
}

#[tokio::test]
async fn release_is_terminal_and_frees_capacity() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let b = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;

  let released = s
    .release(G, p.person_id, Some("sentence served".into()))
    .await
    .unwrap();
  assert_eq!(released.status, PersonStatus::Released);
  assert_eq!(released.actual_release_date, Some(Utc::now().date_naive()));
  assert_eq!(released.release_reason.as_deref(), Some("sentence served"));

  for err in [
    s.release(G, p.person_id, None).await.unwrap_err(),
    s.decease(G, p.person_id).await.unwrap_err(),
    s.transfer(G, p.person_id, b.facility_id, None).await.unwrap_err(),
    s.amend_person(G, p.person_id, PersonAmendment::default())
      .await
      .unwrap_err(),
  ] {
    assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
  }

  person(&s, f.facility_id).await;
}

#[tokio::test]
async fn decease_records_actual_release_date() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;

  let dead = s.decease(G, p.person_id).await.unwrap();
  assert_eq!(dead.status, PersonStatus::Deceased);
  assert!(dead.actual_release_date.is_some());
  assert_eq!(s.active_count(G, f.facility_id).await.unwrap(), 0);
}

#[tokio::test]
async fn amend_updates_details() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;

  let amended = s
    .amend_person(G, p.person_id, PersonAmendment {
      family_name: Some("Moreau-Lind".into()),
      expected_release_date: Some(date(2026, 1, 1)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(amended.family_name, "Moreau-Lind");
  assert_eq!(amended.given_name, "Ada");
  assert_eq!(amended.expected_release_date, Some(date(2026, 1, 1)));
}

#[tokio::test]
async fn list_persons_filters_by_scope_and_status() {
  let s = store().await;
  let a = facility(&s, 5).await;
  let b = facility(&s, 5).await;
  let p1 = person(&s, a.facility_id).await;
  person(&s, a.facility_id).await;
  person(&s, b.facility_id).await;
  s.release(G, p1.person_id, None).await.unwrap();

  assert_eq!(s.list_persons(G, PersonQuery::default()).await.unwrap().len(), 3);

  let scoped = Scope::Facility(a.facility_id);
  assert_eq!(
    s.list_persons(scoped, PersonQuery::default()).await.unwrap().len(),
    2
  );
  let active = s
    .list_persons(scoped, PersonQuery {
      status: Some(PersonStatus::Active),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(active.len(), 1);

  let err = s
    .list_persons(scoped, PersonQuery {
      facility_id: Some(b.facility_id),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Forbidden(_)));

  assert!(
    s.list_persons(Scope::Unassigned, PersonQuery::default())
      .await
      .unwrap()
      .is_empty()
  );
}

// ─── Sentence adjustment ─────────────────────────────────────────────────────

#[tokio::test]
async fn approved_reduction_shifts_expected_release() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;

  let record = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, -10))
    .await
    .unwrap();
  assert_eq!(record.adjustment_status, AdjustmentStatus::Pending);

  let approved = s.approve_adjustment(G, record.record_id).await.unwrap();
  assert_eq!(approved.adjustment_status, AdjustmentStatus::Approved);
  assert!(approved.approved_at.is_some());
  assert_eq!(
    s.get_person(G, p.person_id).await.unwrap().expected_release_date,
    Some(date(2025, 5, 22))
  );
  assert_eq!(s.get_behaviour(G, record.record_id).await.unwrap(), approved);
}

#[tokio::test]
async fn second_approval_applies_nothing() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let record = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Negative, 7))
    .await
    .unwrap();

  s.approve_adjustment(G, record.record_id).await.unwrap();
  let err = s.approve_adjustment(G, record.record_id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
  assert_eq!(
    s.get_person(G, p.person_id).await.unwrap().expected_release_date,
    Some(date(2025, 6, 8))
  );
}

#[tokio::test]
async fn reject_after_approval_changes_nothing() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let record = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, -3))
    .await
    .unwrap();
  let approved = s.approve_adjustment(G, record.record_id).await.unwrap();

  let err = s
    .reject_adjustment(G, record.record_id, Some("changed mind".into()))
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
  assert_eq!(s.get_behaviour(G, record.record_id).await.unwrap(), approved);
}

#[tokio::test]
async fn rejection_keeps_release_date() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let record = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Negative, 30))
    .await
    .unwrap();

  let rejected = s
    .reject_adjustment(G, record.record_id, Some("insufficient evidence".into()))
    .await
    .unwrap();
  assert_eq!(rejected.adjustment_status, AdjustmentStatus::Rejected);
  assert!(rejected.rejected_at.is_some());
  assert_eq!(rejected.rejection_reason.as_deref(), Some("insufficient evidence"));
  assert_eq!(
    s.get_person(G, p.person_id).await.unwrap().expected_release_date,
    p.expected_release_date
  );
}

#[tokio::test]
async fn sign_convention_is_enforced() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;

  let err = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, 5))
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::ValidationFailed(_)));
  assert!(s.list_behaviours(G, p.person_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn zero_adjustment_is_not_applicable() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let record = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Negative, 0))
    .await
    .unwrap();
  assert_eq!(record.adjustment_status, AdjustmentStatus::NotApplicable);

  let err = s.approve_adjustment(G, record.record_id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn approval_without_expected_release_is_recorded() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let mut input = admission(f.facility_id);
  input.expected_release_date = None;
  let p = s.admit(G, input).await.unwrap();
  let record = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, -10))
    .await
    .unwrap();

  let approved = s.approve_adjustment(G, record.record_id).await.unwrap();
  assert_eq!(approved.adjustment_status, AdjustmentStatus::Approved);
  assert_eq!(
    s.get_person(G, p.person_id).await.unwrap().expected_release_date,
    None
  );
}

#[tokio::test]
async fn approval_outside_scope_is_forbidden() {
  let s = store().await;
  let a = facility(&s, 1).await;
  let b = facility(&s, 1).await;
  let p = person(&s, a.facility_id).await;
  let record = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, -1))
    .await
    .unwrap();

  let err = s
    .approve_adjustment(Scope::Facility(b.facility_id), record.record_id)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Forbidden(_)));
  assert_eq!(
    s.get_behaviour(G, record.record_id).await.unwrap().adjustment_status,
    AdjustmentStatus::Pending
  );
}

#[tokio::test]
async fn bulk_approval_reports_each_record() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let r1 = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, -2))
    .await
    .unwrap();
  let r2 = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Negative, 0))
    .await
    .unwrap();
  let r3 = s
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, -3))
    .await
    .unwrap();
  let missing = Uuid::new_v4();

  let outcomes = s
    .approve_adjustments(G, vec![r1.record_id, r2.record_id, missing, r3.record_id])
    .await;
  assert_eq!(outcomes.len(), 4);
  assert!(outcomes[0].result.is_ok());
  assert!(matches!(
    domain(outcomes[1].result.as_ref().unwrap_err()),
    CoreError::InvalidTransition(_)
  ));
  assert_eq!(outcomes[2].record_id, missing);
  assert!(matches!(
    domain(outcomes[2].result.as_ref().unwrap_err()),
    CoreError::NotFound { .. }
  ));
  assert!(outcomes[3].result.is_ok());

  assert_eq!(
    s.get_person(G, p.person_id).await.unwrap().expected_release_date,
    Some(date(2025, 5, 27))
  );
}

// ─── Work & payment ──────────────────────────────────────────────────────────

fn work(person_id: Uuid) -> NewWorkRecord {
  NewWorkRecord {
    person_id,
    work_date: date(2025, 2, 1),
    task: "laundry".into(),
    hours_worked: 6.5,
    payment_cents: 1300,
  }
}

#[tokio::test]
async fn pending_work_can_be_edited() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let w = s.record_work(G, work(p.person_id)).await.unwrap();
  assert_eq!(w.payment_status, PaymentStatus::Pending);

  let updated = s
    .update_work(G, w.work_id, WorkUpdate {
      hours_worked: Some(8.0),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.hours_worked, 8.0);
  assert_eq!(updated.task, "laundry");
  assert_eq!(s.list_work(G, p.person_id).await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn paid_work_is_frozen() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let w = s.record_work(G, work(p.person_id)).await.unwrap();

  let paid = s.approve_payment(G, w.work_id).await.unwrap();
  assert_eq!(paid.payment_status, PaymentStatus::Paid);
  assert_eq!(paid.payment_date, Some(Utc::now().date_naive()));

  for err in [
    s.update_work(G, w.work_id, WorkUpdate {
      task: Some("kitchen".into()),
      ..Default::default()
    })
    .await
    .unwrap_err(),
    s.delete_work(G, w.work_id).await.unwrap_err(),
    s.approve_payment(G, w.work_id).await.unwrap_err(),
  ] {
    assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
  }
  assert_eq!(s.list_work(G, p.person_id).await.unwrap(), vec![paid]);
}

#[tokio::test]
async fn pending_work_can_be_deleted() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let w = s.record_work(G, work(p.person_id)).await.unwrap();

  s.delete_work(G, w.work_id).await.unwrap();
  assert!(s.list_work(G, p.person_id).await.unwrap().is_empty());
  let err = s.delete_work(G, w.work_id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { .. }));
}

#[tokio::test]
async fn work_input_is_validated() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;

  let mut too_long = work(p.person_id);
  too_long.hours_worked = 25.0;
  let err = s.record_work(G, too_long).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::ValidationFailed(_)));

  let mut negative = work(p.person_id);
  negative.payment_cents = -1;
  let err = s.record_work(G, negative).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::ValidationFailed(_)));

  s.release(G, p.person_id, None).await.unwrap();
  let err = s.record_work(G, work(p.person_id)).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
}

// ─── Visits ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_visits_conflict_back_to_back_do_not() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let v = visitor(&s).await;
  let day = date(2025, 1, 10);

  book(&s, p.person_id, v.visitor_id, window(day, (9, 0), (9, 30)))
    .await
    .unwrap();

  let err = book(&s, p.person_id, v.visitor_id, window(day, (9, 15), (9, 45)))
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Conflict(_)));

  book(&s, p.person_id, v.visitor_id, window(day, (9, 30), (10, 0)))
    .await
    .unwrap();
  assert_eq!(s.list_visits(G, p.person_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn cancelled_visit_frees_its_slot() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let v = visitor(&s).await;
  let w = window(date(2025, 1, 10), (14, 0), (15, 0));

  let first = book(&s, p.person_id, v.visitor_id, w).await.unwrap();
  assert!(s.has_visit_conflict(G, p.person_id, w, None).await.unwrap());

  let cancelled = s.cancel_visit(G, first.visit_id).await.unwrap();
  assert_eq!(cancelled.status, VisitStatus::Cancelled);
  assert!(!s.has_visit_conflict(G, p.person_id, w, None).await.unwrap());
  book(&s, p.person_id, v.visitor_id, w).await.unwrap();
}

#[tokio::test]
async fn reschedule_ignores_own_slot() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let v = visitor(&s).await;
  let day = date(2025, 3, 4);

  let a = book(&s, p.person_id, v.visitor_id, window(day, (10, 0), (11, 0)))
    .await
    .unwrap();
  let b = book(&s, p.person_id, v.visitor_id, window(day, (12, 0), (12, 30)))
    .await
    .unwrap();

  let moved = s
    .reschedule_visit(G, a.visit_id, window(day, (10, 30), (11, 30)))
    .await
    .unwrap();
  assert_eq!(moved.window.time_start, NaiveTime::from_hms_opt(10, 30, 0).unwrap());

  let err = s
    .reschedule_visit(G, a.visit_id, window(day, (11, 45), (12, 15)))
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Conflict(_)));
  assert!(
    !s.has_visit_conflict(G, p.person_id, b.window, Some(b.visit_id))
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn visit_window_bounds_are_enforced() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let v = visitor(&s).await;
  let day = date(2025, 1, 10);

  for w in [
    window(day, (9, 0), (9, 10)),
    window(day, (9, 0), (11, 30)),
    window(day, (10, 0), (9, 0)),
  ] {
    let err = book(&s, p.person_id, v.visitor_id, w).await.unwrap_err();
    assert!(matches!(domain(&err), CoreError::ValidationFailed(_)));
  }
  book(&s, p.person_id, v.visitor_id, window(day, (9, 0), (9, 15)))
    .await
    .unwrap();
  book(&s, p.person_id, v.visitor_id, window(day, (10, 0), (12, 0)))
    .await
    .unwrap();
}

#[tokio::test]
async fn booked_visit_matches_stored_row() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let v = visitor(&s).await;

  let mut w = window(date(2025, 1, 10), (9, 0), (10, 0));
  w.time_start = NaiveTime::from_hms_milli_opt(9, 0, 0, 250).unwrap();
  let booked = book(&s, p.person_id, v.visitor_id, w).await.unwrap();

  assert_eq!(booked.window.time_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
  assert_eq!(s.list_visits(G, p.person_id).await.unwrap(), vec![booked]);
}

#[tokio::test]
async fn visit_status_moves_once() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let v = visitor(&s).await;
  let visit = book(
    &s,
    p.person_id,
    v.visitor_id,
    window(date(2025, 1, 10), (9, 0), (9, 30)),
  )
  .await
  .unwrap();

  let done = s.complete_visit(G, visit.visit_id).await.unwrap();
  assert_eq!(done.status, VisitStatus::Completed);
  let err = s.cancel_visit(G, visit.visit_id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn booking_requires_known_visitor_and_active_person() {
  let s = store().await;
  let f = facility(&s, 1).await;
  let p = person(&s, f.facility_id).await;
  let w = window(date(2025, 1, 10), (9, 0), (9, 30));

  let err = book(&s, p.person_id, Uuid::new_v4(), w).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { .. }));

  let v = visitor(&s).await;
  s.release(G, p.person_id, None).await.unwrap();
  let err = book(&s, p.person_id, v.visitor_id, w).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn visitor_national_id_is_unique() {
  let s = store().await;
  let v = visitor(&s).await;
  assert_eq!(s.get_visitor(v.visitor_id).await.unwrap(), v);

  let err = s
    .register_visitor(NewVisitor {
      national_id:  v.national_id.clone(),
      full_name:    "Someone Else".into(),
      relationship: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::Conflict(_)));
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

/// A database file shared by two independent connections, removed on drop.
struct SharedDb {
  path: PathBuf,
}

impl SharedDb {
  fn new() -> Self {
    let path = std::env::temp_dir().join(format!("warden-{}.db", Uuid::new_v4()));
    Self { path }
  }

  async fn pair(&self) -> (SqliteStore, SqliteStore) {
    let a = SqliteStore::open(&self.path).await.unwrap();
    let b = SqliteStore::open(&self.path).await.unwrap();
    (a, b)
  }
}

impl Drop for SharedDb {
  fn drop(&mut self) {
    for suffix in ["", "-wal", "-shm"] {
      let mut file = self.path.clone().into_os_string();
      file.push(suffix);
      let _ = std::fs::remove_file(file);
    }
  }
}

#[tokio::test]
async fn racing_admissions_never_overshoot_capacity() {
  let db = SharedDb::new();
  let (a, b) = db.pair().await;
  let f = facility(&a, 1).await;

  let (ra, rb) = tokio::join!(
    a.admit(G, admission(f.facility_id)),
    b.admit(G, admission(f.facility_id)),
  );
  let results = [ra, rb];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let err = results.into_iter().find_map(Result::err).unwrap();
  assert!(matches!(domain(&err), CoreError::CapacityExceeded { .. }));
  assert_eq!(a.active_count(G, f.facility_id).await.unwrap(), 1);
}

#[tokio::test]
async fn many_racing_admissions_fill_exactly_to_capacity() {
  let db = SharedDb::new();
  let (a, b) = db.pair().await;
  let f = facility(&a, 3).await;

  let handles: Vec<_> = (0..8)
    .map(|i| {
      let s = if i % 2 == 0 { a.clone() } else { b.clone() };
      let input = admission(f.facility_id);
      tokio::spawn(async move { s.admit(G, input).await })
    })
    .collect();

  let mut admitted = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => admitted += 1,
      Err(err) => assert!(matches!(domain(&err), CoreError::CapacityExceeded { .. })),
    }
  }
  assert_eq!(admitted, 3);
  assert_eq!(b.active_count(G, f.facility_id).await.unwrap(), 3);
}

#[tokio::test]
async fn racing_approvals_apply_delta_once() {
  let db = SharedDb::new();
  let (a, b) = db.pair().await;
  let f = facility(&a, 1).await;
  let p = person(&a, f.facility_id).await;
  let record = a
    .record_behaviour(G, behaviour(p.person_id, BehaviourType::Positive, -10))
    .await
    .unwrap();

  let (ra, rb) = tokio::join!(
    a.approve_adjustment(G, record.record_id),
    b.approve_adjustment(G, record.record_id),
  );
  let results = [ra, rb];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let err = results.into_iter().find_map(Result::err).unwrap();
  assert!(matches!(domain(&err), CoreError::InvalidTransition(_)));
  assert_eq!(
    a.get_person(G, p.person_id).await.unwrap().expected_release_date,
    Some(date(2025, 5, 22))
  );
}

#[tokio::test]
async fn racing_bookings_never_overlap() {
  let db = SharedDb::new();
  let (a, b) = db.pair().await;
  let f = facility(&a, 1).await;
  let p = person(&a, f.facility_id).await;
  let v = visitor(&a).await;
  let day = date(2025, 1, 10);

  let (ra, rb) = tokio::join!(
    book(&a, p.person_id, v.visitor_id, window(day, (9, 0), (9, 30))),
    book(&b, p.person_id, v.visitor_id, window(day, (9, 15), (9, 45))),
  );
  let results = [ra, rb];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let err = results.into_iter().find_map(Result::err).unwrap();
  assert!(matches!(domain(&err), CoreError::Conflict(_)));
  assert_eq!(b.list_visits(G, p.person_id).await.unwrap().len(), 1);
}
