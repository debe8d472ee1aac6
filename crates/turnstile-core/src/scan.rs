//! Scan resolution — the stage-progression state machine.
//!
//! A scanned payload is matched against the current record list by
//! structural equality of the identity triple, and the first pending stage
//! in the fixed order 1, 2, 3 is selected as the target. Resolution never
//! mutates anything; the caller applies the result through the store.

use uuid::Uuid;

use crate::{
  Error, Result,
  payload::CodePayload,
  record::{Record, StageKey},
};

/// The outcome of resolving a scanned payload: which record matched and
/// which stage the scan should advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResolution {
  pub record_id: Uuid,
  pub stage:     StageKey,
}

/// Match `payload` against `records` and select the target stage.
///
/// Identity triples carry no uniqueness guarantee; when several records
/// match, the first in list order wins (callers pass the list newest-first).
pub fn resolve_scan(
  payload: &CodePayload,
  records: &[Record],
) -> Result<ScanResolution> {
  let record = records
    .iter()
    .find(|r| r.matches(payload))
    .ok_or(Error::NoMatchingRecord)?;

  let stage = record.stages.first_pending().ok_or(Error::AllStagesComplete {
    record_id: record.record_id,
  })?;

  Ok(ScanResolution {
    record_id: record.record_id,
    stage,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::record::{Stage, Stages};

  fn record(name: &str, plate: &str, id_number: &str) -> Record {
    let payload = CodePayload {
      name:                 name.into(),
      license_plate:        plate.into(),
      identity_card_number: id_number.into(),
    };
    Record {
      record_id:            Uuid::new_v4(),
      name:                 name.into(),
      license_plate:        plate.into(),
      identity_card_number: id_number.into(),
      code_payload:         payload.encode().unwrap(),
      created_at:           Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
      stages:               Stages::default(),
    }
  }

  fn checked() -> Stage {
    Stage::Checked {
      scan_time: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    }
  }

  #[test]
  fn resolves_first_pending_stage() {
    let mut r = record("John Doe", "ABC123", "1234567890");
    r.stages.one = checked();

    let records = vec![r.clone()];
    let res = resolve_scan(&r.payload(), &records).unwrap();
    assert_eq!(res.record_id, r.record_id);
    assert_eq!(res.stage, StageKey::Two);
  }

  #[test]
  fn fresh_record_resolves_stage_one() {
    let r = record("John Doe", "ABC123", "1234567890");
    let res = resolve_scan(&r.payload(), std::slice::from_ref(&r)).unwrap();
    assert_eq!(res.stage, StageKey::One);
  }

  #[test]
  fn unmatched_payload_is_no_matching_record() {
    let r = record("John Doe", "ABC123", "1234567890");
    let other = CodePayload {
      name:                 "Jane Roe".into(),
      license_plate:        "XYZ789".into(),
      identity_card_number: "0987654321".into(),
    };
    let err = resolve_scan(&other, std::slice::from_ref(&r)).unwrap_err();
    assert!(matches!(err, Error::NoMatchingRecord));
  }

  #[test]
  fn partial_identity_match_does_not_resolve() {
    let r = record("John Doe", "ABC123", "1234567890");
    let mut payload = r.payload();
    payload.identity_card_number = "1111111111".into();
    let err = resolve_scan(&payload, std::slice::from_ref(&r)).unwrap_err();
    assert!(matches!(err, Error::NoMatchingRecord));
  }

  #[test]
  fn fully_checked_record_is_all_stages_complete() {
    let mut r = record("John Doe", "ABC123", "1234567890");
    r.stages.one = checked();
    r.stages.two = checked();
    r.stages.three = checked();

    let err = resolve_scan(&r.payload(), std::slice::from_ref(&r)).unwrap_err();
    assert!(matches!(
      err,
      Error::AllStagesComplete { record_id } if record_id == r.record_id
    ));
  }

  #[test]
  fn duplicate_identity_triples_resolve_to_first_in_list_order() {
    let newer = record("John Doe", "ABC123", "1234567890");
    let older = record("John Doe", "ABC123", "1234567890");

    let records = vec![newer.clone(), older];
    let res = resolve_scan(&newer.payload(), &records).unwrap();
    assert_eq!(res.record_id, newer.record_id);
  }
}
