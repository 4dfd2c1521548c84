//! Capacity guard.
//!
//! These checks are pure: they compare a facility against an active count the
//! caller has already read. Callers must read that count inside the same
//! write transaction that performs the admission, transfer, or update, so the
//! count cannot move between the check and the commit.

use crate::{
  Error, Result,
  facility::{Facility, FacilityUpdate},
};

/// Whether `facility` can take one more active person.
pub fn check_admission(facility: &Facility, active: u32) -> Result<()> {
  check_intake(facility, active, "admissions")
}

/// Whether `target` can receive one transferred person.
pub fn check_transfer(target: &Facility, active: u32) -> Result<()> {
  check_intake(target, active, "transfers")
}

fn check_intake(facility: &Facility, active: u32, what: &str) -> Result<()> {
  if !facility.active {
    return Err(Error::InvalidTransition(format!(
      "facility {} is inactive and accepts no {what}",
      facility.facility_id
    )));
  }
  if active >= facility.capacity {
    return Err(Error::CapacityExceeded {
      facility_id: facility.facility_id,
      capacity:    facility.capacity,
      active,
    });
  }
  Ok(())
}

/// Apply `update` to `facility`, given its current active population.
///
/// Capacity may never drop below `active`, and a facility still housing
/// anyone cannot be deactivated.
pub fn apply_update(
  facility: &mut Facility,
  update: FacilityUpdate,
  active: u32,
) -> Result<()> {
  if let Some(capacity) = update.capacity
    && capacity < active
  {
    return Err(Error::CapacityExceeded {
      facility_id: facility.facility_id,
      capacity,
      active,
    });
  }
  if update.active == Some(false) && active > 0 {
    return Err(Error::InvalidTransition(format!(
      "facility {} still houses {active} active persons",
      facility.facility_id
    )));
  }

  if let Some(name) = update.name {
    facility.name = name;
  }
  if let Some(capacity) = update.capacity {
    facility.capacity = capacity;
  }
  if let Some(active_flag) = update.active {
    facility.active = active_flag;
  }
  Ok(())
}
