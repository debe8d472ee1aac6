//! Record and stage types — the unit of check-in tracking.
//!
//! A record is created once, read repeatedly, and has individual stages
//! checked in place by scan events. There is no identity-edit path: the code
//! payload is derived from the identity fields at creation and editing them
//! afterwards would desynchronise the printed code from the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, payload::CodePayload, validate};

// ─── Stage keys ──────────────────────────────────────────────────────────────

/// One of the three ordered checkpoints a record passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKey {
  #[serde(rename = "1")]
  One,
  #[serde(rename = "2")]
  Two,
  #[serde(rename = "3")]
  Three,
}

impl StageKey {
  /// All keys in scan order. A scan always advances the first pending stage
  /// in this order.
  pub const ALL: [StageKey; 3] = [StageKey::One, StageKey::Two, StageKey::Three];

  /// The wire string used as the stage-map key.
  pub fn as_str(self) -> &'static str {
    match self {
      StageKey::One => "1",
      StageKey::Two => "2",
      StageKey::Three => "3",
    }
  }
}

impl std::fmt::Display for StageKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Stage ───────────────────────────────────────────────────────────────────

/// The state of a single checkpoint.
///
/// `scan_time` exists only on the `Checked` variant, so the
/// "scan time iff checked" invariant holds by construction.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
  #[default]
  Pending,
  Checked { scan_time: DateTime<Utc> },
}

impl Stage {
  pub fn is_pending(&self) -> bool { matches!(self, Stage::Pending) }

  pub fn is_checked(&self) -> bool { matches!(self, Stage::Checked { .. }) }

  pub fn scan_time(&self) -> Option<DateTime<Utc>> {
    match self {
      Stage::Checked { scan_time } => Some(*scan_time),
      Stage::Pending => None,
    }
  }
}

/// The requested status for the raw, unguarded stage update
/// ([`crate::store::RecordStore::update_stage`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
  Pending,
  Checked,
}

// ─── Stages ──────────────────────────────────────────────────────────────────

/// Exactly three stage entries, keyed `"1"`/`"2"`/`"3"` on the wire, present
/// from creation. Defaults to all pending.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct Stages {
  #[serde(rename = "1")]
  pub one:   Stage,
  #[serde(rename = "2")]
  pub two:   Stage,
  #[serde(rename = "3")]
  pub three: Stage,
}

impl Stages {
  pub fn get(&self, key: StageKey) -> &Stage {
    match key {
      StageKey::One => &self.one,
      StageKey::Two => &self.two,
      StageKey::Three => &self.three,
    }
  }

  pub fn set(&mut self, key: StageKey, stage: Stage) {
    match key {
      StageKey::One => self.one = stage,
      StageKey::Two => self.two = stage,
      StageKey::Three => self.three = stage,
    }
  }

  /// Iterate entries in scan order.
  pub fn iter(&self) -> impl Iterator<Item = (StageKey, &Stage)> {
    StageKey::ALL.iter().map(move |&k| (k, self.get(k)))
  }

  /// The first pending key in scan order — the target of the next scan.
  pub fn first_pending(&self) -> Option<StageKey> {
    StageKey::ALL.into_iter().find(|&k| self.get(k).is_pending())
  }

  /// The last checked key in scan order, if any.
  pub fn last_checked(&self) -> Option<StageKey> {
    StageKey::ALL
      .into_iter()
      .rev()
      .find(|&k| self.get(k).is_checked())
  }

  pub fn all_checked(&self) -> bool {
    StageKey::ALL.into_iter().all(|k| self.get(k).is_checked())
  }

  /// The guarded `Pending → Checked` transition.
  ///
  /// Only a pending stage may be checked; re-checking is rejected rather
  /// than silently overwritten. Unconditional writes go through
  /// [`crate::store::RecordStore::update_stage`] instead.
  pub fn check(&mut self, key: StageKey, at: DateTime<Utc>) -> Result<()> {
    let slot = self.get(key);
    if slot.is_checked() {
      return Err(Error::StageAlreadyChecked { stage: key });
    }
    self.set(key, Stage::Checked { scan_time: at });
    Ok(())
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A tracked user: identity triple, the code payload printed for them, and
/// one stage entry per checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub record_id:            Uuid,
  pub name:                 String,
  pub license_plate:        String,
  pub identity_card_number: String,
  /// Serialized identity triple, fixed at creation — the matching key used
  /// when a code is scanned later. Never rewritten.
  pub code_payload:         String,
  /// Store-assigned; never changes after creation. Display order is newest
  /// first.
  pub created_at:           DateTime<Utc>,
  pub stages:               Stages,
}

impl Record {
  /// The identity triple as a payload value.
  pub fn payload(&self) -> CodePayload {
    CodePayload {
      name:                 self.name.clone(),
      license_plate:        self.license_plate.clone(),
      identity_card_number: self.identity_card_number.clone(),
    }
  }

  /// Structural, value-by-value match against a scanned payload.
  pub fn matches(&self, payload: &CodePayload) -> bool {
    self.name == payload.name
      && self.license_plate == payload.license_plate
      && self.identity_card_number == payload.identity_card_number
  }
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::create`].
/// The id, creation time, code payload, and stage map are assigned by the
/// store; they are not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub name:                 String,
  pub license_plate:        String,
  pub identity_card_number: String,
}

impl NewRecord {
  /// Check all three field format rules. The registration form refuses
  /// submission while this fails; the store itself does not validate.
  pub fn validate(&self) -> Result<()> {
    if !validate::is_valid_name(&self.name) {
      return Err(Error::ValidationFailed {
        field:  "name",
        reason: validate::NAME_RULE,
      });
    }
    if !validate::is_valid_license_plate(&self.license_plate) {
      return Err(Error::ValidationFailed {
        field:  "license_plate",
        reason: validate::LICENSE_PLATE_RULE,
      });
    }
    if !validate::is_valid_identity_card(&self.identity_card_number) {
      return Err(Error::ValidationFailed {
        field:  "identity_card_number",
        reason: validate::IDENTITY_CARD_RULE,
      });
    }
    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use serde_json::json;

  use super::*;

  fn noon() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
  }

  #[test]
  fn new_stages_are_all_pending_without_scan_time() {
    let stages = Stages::default();
    for key in StageKey::ALL {
      assert!(stages.get(key).is_pending());
      assert_eq!(stages.get(key).scan_time(), None);
    }
  }

  #[test]
  fn check_sets_scan_time() {
    let mut stages = Stages::default();
    stages.check(StageKey::One, noon()).unwrap();
    assert!(stages.one.is_checked());
    assert_eq!(stages.one.scan_time(), Some(noon()));
  }

  #[test]
  fn check_rejects_already_checked_stage() {
    let mut stages = Stages::default();
    stages.check(StageKey::One, noon()).unwrap();

    let err = stages.check(StageKey::One, noon()).unwrap_err();
    assert!(matches!(
      err,
      Error::StageAlreadyChecked { stage: StageKey::One }
    ));
    // The original scan time is untouched.
    assert_eq!(stages.one.scan_time(), Some(noon()));
  }

  #[test]
  fn first_pending_follows_scan_order() {
    let mut stages = Stages::default();
    assert_eq!(stages.first_pending(), Some(StageKey::One));

    stages.check(StageKey::One, noon()).unwrap();
    assert_eq!(stages.first_pending(), Some(StageKey::Two));

    stages.check(StageKey::Two, noon()).unwrap();
    stages.check(StageKey::Three, noon()).unwrap();
    assert_eq!(stages.first_pending(), None);
    assert!(stages.all_checked());
  }

  #[test]
  fn last_checked_is_reverse_scan_order() {
    let mut stages = Stages::default();
    assert_eq!(stages.last_checked(), None);

    stages.check(StageKey::One, noon()).unwrap();
    stages.check(StageKey::Two, noon()).unwrap();
    assert_eq!(stages.last_checked(), Some(StageKey::Two));
  }

  #[test]
  fn stage_wire_encoding_matches_store_rows() {
    assert_eq!(
      serde_json::to_value(Stage::Pending).unwrap(),
      json!({ "status": "PENDING" })
    );

    let checked = Stage::Checked { scan_time: noon() };
    let value = serde_json::to_value(checked).unwrap();
    assert_eq!(value["status"], "CHECKED");
    assert!(value["scan_time"].is_string());

    let stages = Stages::default();
    let map = serde_json::to_value(stages).unwrap();
    assert!(map.get("1").is_some());
    assert!(map.get("2").is_some());
    assert!(map.get("3").is_some());
  }

  #[test]
  fn validate_rejects_bad_fields() {
    let mut input = NewRecord {
      name:                 "John Doe".into(),
      license_plate:        "ABC123".into(),
      identity_card_number: "1234567890".into(),
    };
    assert!(input.validate().is_ok());

    input.license_plate = "abc12".into();
    assert!(matches!(
      input.validate(),
      Err(Error::ValidationFailed { field: "license_plate", .. })
    ));
  }
}
