//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use turnstile_core::{
  payload::CodePayload,
  record::{NewRecord, StageKey, StageStatus},
  scan::resolve_scan,
  store::RecordStore,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn john_doe() -> NewRecord {
  NewRecord {
    name:                 "John Doe".into(),
    license_plate:        "ABC123".into(),
    identity_card_number: "1234567890".into(),
  }
}

fn jane_roe() -> NewRecord {
  NewRecord {
    name:                 "Jane Roe".into(),
    license_plate:        "XYZ789".into(),
    identity_card_number: "0987654321".into(),
  }
}

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_initializes_three_pending_stages() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  for key in StageKey::ALL {
    let stage = record.stages.get(key);
    assert!(stage.is_pending());
    assert_eq!(stage.scan_time(), None);
  }

  // The persisted row matches what create returned.
  let fetched = s.get(record.record_id).await.unwrap().unwrap();
  assert_eq!(fetched, record);
}

#[tokio::test]
async fn create_derives_code_payload_from_identity_fields() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  let payload = CodePayload::decode(&record.code_payload).unwrap();
  assert_eq!(payload, record.payload());
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  let result = s.get(Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_is_newest_first() {
  let s = store().await;
  let first = s.create(john_doe()).await.unwrap();
  tokio::time::sleep(Duration::from_millis(10)).await;
  let second = s.create(jane_roe()).await.unwrap();

  let list = s.list().await.unwrap();
  assert_eq!(list.len(), 2);
  assert_eq!(list[0].record_id, second.record_id);
  assert_eq!(list[1].record_id, first.record_id);
}

// ─── Raw stage updates ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_stage_checked_sets_scan_time() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  s.update_stage(record.record_id, StageKey::Two, StageStatus::Checked)
    .await
    .unwrap();

  let fetched = s.get(record.record_id).await.unwrap().unwrap();
  assert!(fetched.stages.two.is_checked());
  assert!(fetched.stages.two.scan_time().is_some());
  assert!(fetched.stages.one.is_pending());
  assert!(fetched.stages.three.is_pending());
}

#[tokio::test]
async fn update_stage_pending_clears_scan_time() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  s.update_stage(record.record_id, StageKey::One, StageStatus::Checked)
    .await
    .unwrap();
  s.update_stage(record.record_id, StageKey::One, StageStatus::Pending)
    .await
    .unwrap();

  let fetched = s.get(record.record_id).await.unwrap().unwrap();
  assert!(fetched.stages.one.is_pending());
  assert_eq!(fetched.stages.one.scan_time(), None);
}

#[tokio::test]
async fn update_stage_overwrite_refreshes_scan_time() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  s.update_stage(record.record_id, StageKey::One, StageStatus::Checked)
    .await
    .unwrap();
  let before = s
    .get(record.record_id)
    .await
    .unwrap()
    .unwrap()
    .stages
    .one
    .scan_time()
    .unwrap();

  tokio::time::sleep(Duration::from_millis(10)).await;

  // Re-checking is an overwrite, not a rejection: status stays checked and
  // the timestamp is refreshed.
  s.update_stage(record.record_id, StageKey::One, StageStatus::Checked)
    .await
    .unwrap();
  let after = s
    .get(record.record_id)
    .await
    .unwrap()
    .unwrap()
    .stages
    .one
    .scan_time()
    .unwrap();

  assert!(after >= before);
}

#[tokio::test]
async fn update_stage_unknown_record_fails() {
  let s = store().await;
  let err = s
    .update_stage(Uuid::new_v4(), StageKey::One, StageStatus::Checked)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::RecordNotFound(_)));
}

// ─── Guarded advancement ─────────────────────────────────────────────────────

#[tokio::test]
async fn advance_stage_checks_a_pending_stage() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  let updated = s
    .advance_stage(record.record_id, StageKey::One)
    .await
    .unwrap();
  assert!(updated.stages.one.is_checked());
  assert!(updated.stages.one.scan_time().is_some());
}

#[tokio::test]
async fn advance_stage_rejects_an_already_checked_stage() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  s.advance_stage(record.record_id, StageKey::One)
    .await
    .unwrap();
  let err = s
    .advance_stage(record.record_id, StageKey::One)
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::Core(turnstile_core::Error::StageAlreadyChecked {
      stage: StageKey::One
    })
  ));
}

// ─── Change notification ─────────────────────────────────────────────────────

#[tokio::test]
async fn subscribe_delivers_full_list_on_create() {
  let s = store().await;
  let mut rx = s.subscribe();

  let record = s.create(john_doe()).await.unwrap();

  let list = rx.recv().await.unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0].record_id, record.record_id);
}

#[tokio::test]
async fn subscribe_delivers_on_stage_update() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();

  let mut rx = s.subscribe();
  s.update_stage(record.record_id, StageKey::One, StageStatus::Checked)
    .await
    .unwrap();

  let list = rx.recv().await.unwrap();
  assert!(list[0].stages.one.is_checked());
}

#[tokio::test]
async fn dropped_subscriber_does_not_block_writers() {
  let s = store().await;
  let rx = s.subscribe();
  drop(rx);

  // Mutations succeed with no live subscribers.
  s.create(john_doe()).await.unwrap();
  s.create(jane_roe()).await.unwrap();
}

// ─── End-to-end scan scenario ────────────────────────────────────────────────

#[tokio::test]
async fn four_scans_walk_the_stages_then_fail() {
  let s = store().await;
  let record = s.create(john_doe()).await.unwrap();
  let payload = CodePayload::decode(&record.code_payload).unwrap();

  // Three scans check stages 1, 2, 3 in order.
  for expected in StageKey::ALL {
    let records = s.list().await.unwrap();
    let res = resolve_scan(&payload, &records).unwrap();
    assert_eq!(res.record_id, record.record_id);
    assert_eq!(res.stage, expected);

    let updated = s.advance_stage(res.record_id, res.stage).await.unwrap();
    assert!(updated.stages.get(expected).is_checked());
    assert!(updated.stages.get(expected).scan_time().is_some());
  }

  // A fourth scan finds no pending stage.
  let records = s.list().await.unwrap();
  let err = resolve_scan(&payload, &records).unwrap_err();
  assert!(matches!(
    err,
    turnstile_core::Error::AllStagesComplete { record_id }
      if record_id == record.record_id
  ));
}
