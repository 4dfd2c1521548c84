//! Behaviour records and the sentence adjustments they may propose.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BehaviourType {
  Positive,
  Negative,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
  Minor,
  Moderate,
  Severe,
}

/// Where a record's proposed sentence adjustment stands.
///
/// `NotApplicable`, `Approved` and `Rejected` are terminal; `Pending` moves
/// forward exactly once.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdjustmentStatus {
  NotApplicable,
  Pending,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourRecord {
  pub record_id:                Uuid,
  pub person_id:                Uuid,
  pub behaviour_type:           BehaviourType,
  pub severity:                 Severity,
  pub description:              String,
  pub incident_date:            NaiveDate,
  /// Signed day delta: negative shortens the sentence, positive extends it,
  /// zero proposes nothing.
  pub sentence_adjustment_days: i32,
  pub adjustment_status:        AdjustmentStatus,
  /// Set once, on approval.
  pub approved_at:              Option<DateTime<Utc>>,
  /// Set once, on rejection.
  pub rejected_at:              Option<DateTime<Utc>>,
  pub rejection_reason:         Option<String>,
  pub recorded_at:              DateTime<Utc>,
}

/// Input to [`crate::store::CustodyStore::record_behaviour`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewBehaviourRecord {
  pub person_id:                Uuid,
  pub behaviour_type:           BehaviourType,
  pub severity:                 Severity,
  pub description:              String,
  pub incident_date:            NaiveDate,
  #[serde(default)]
  pub sentence_adjustment_days: i32,
}

impl NewBehaviourRecord {
  /// Check the sign convention and derive the initial adjustment status.
  ///
  /// Positive behaviour may only shorten (`days <= 0`); negative behaviour
  /// may only extend (`days >= 0`).
  pub fn initial_status(&self) -> Result<AdjustmentStatus> {
    let days = self.sentence_adjustment_days;
    match self.behaviour_type {
      BehaviourType::Positive if days > 0 => {
        return Err(Error::ValidationFailed(format!(
          "positive behaviour cannot extend a sentence (got {days} days)"
        )));
      }
      BehaviourType::Negative if days < 0 => {
        return Err(Error::ValidationFailed(format!(
          "negative behaviour cannot shorten a sentence (got {days} days)"
        )));
      }
      _ => {}
    }

    Ok(if days == 0 {
      AdjustmentStatus::NotApplicable
    } else {
      AdjustmentStatus::Pending
    })
  }

  pub fn into_record(self, now: DateTime<Utc>) -> Result<BehaviourRecord> {
    let adjustment_status = self.initial_status()?;
    Ok(BehaviourRecord {
      record_id: Uuid::new_v4(),
      person_id: self.person_id,
      behaviour_type: self.behaviour_type,
      severity: self.severity,
      description: self.description,
      incident_date: self.incident_date,
      sentence_adjustment_days: self.sentence_adjustment_days,
      adjustment_status,
      approved_at: None,
      rejected_at: None,
      rejection_reason: None,
      recorded_at: now,
    })
  }
}
