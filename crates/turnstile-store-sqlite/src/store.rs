//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use uuid::Uuid;

use turnstile_core::{
  payload::CodePayload,
  record::{NewRecord, Record, Stage, StageKey, StageStatus, Stages},
  store::RecordStore,
};

use crate::{
  Error, Result,
  encode::{RawRecord, decode_stages, encode_dt, encode_stages, encode_uuid},
  schema::SCHEMA,
};

const LIST_SQL: &str = "SELECT record_id, name, license_plate, \
   identity_card_number, code_payload, created_at, stages FROM records";

/// Capacity of the change-notification channel. A subscriber that falls
/// behind receives `Lagged` and reloads instead of blocking writers.
const CHANGE_CAPACITY: usize = 16;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A turnstile record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and clones
/// share one change-notification channel.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<Vec<Record>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Query the full record list, newest creation time first.
  async fn query_list(&self) -> Result<Vec<Record>> {
    let raw: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("{LIST_SQL} ORDER BY created_at DESC"))?;
        let rows = stmt
          .query_map([], |r| {
            Ok(RawRecord {
              record_id:            r.get(0)?,
              name:                 r.get(1)?,
              license_plate:        r.get(2)?,
              identity_card_number: r.get(3)?,
              code_payload:         r.get(4)?,
              created_at:           r.get(5)?,
              stages:               r.get(6)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(RawRecord::into_record).collect()
  }

  async fn query_one(&self, record_id: Uuid) -> Result<Option<Record>> {
    let id_str = encode_uuid(record_id);
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            &format!("{LIST_SQL} WHERE record_id = ?1"),
            rusqlite::params![id_str],
            |r| {
              Ok(RawRecord {
                record_id:            r.get(0)?,
                name:                 r.get(1)?,
                license_plate:        r.get(2)?,
                identity_card_number: r.get(3)?,
                code_payload:         r.get(4)?,
                created_at:           r.get(5)?,
                stages:               r.get(6)?,
              })
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  /// Load just the stage map for `record_id`.
  async fn load_stages(&self, record_id: Uuid) -> Result<Stages> {
    let id_str = encode_uuid(record_id);
    let stages_str: Option<String> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT stages FROM records WHERE record_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    let stages_str = stages_str.ok_or(Error::RecordNotFound(record_id))?;
    decode_stages(&stages_str)
  }

  /// Write back a record's stage map.
  async fn write_stages(&self, record_id: Uuid, stages: &Stages) -> Result<()> {
    let id_str = encode_uuid(record_id);
    let stages_str = encode_stages(stages)?;

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE records SET stages = ?2 WHERE record_id = ?1",
          rusqlite::params![id_str, stages_str],
        )?;
        Ok(n)
      })
      .await?;

    if updated == 0 {
      return Err(Error::RecordNotFound(record_id));
    }
    Ok(())
  }

  /// Re-query the ordered list and publish it to subscribers. A send error
  /// just means no live subscribers.
  async fn notify_change(&self) -> Result<()> {
    let list = self.query_list().await?;
    let _ = self.changes.send(list);
    Ok(())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn create(&self, input: NewRecord) -> Result<Record> {
    let payload = CodePayload {
      name:                 input.name.clone(),
      license_plate:        input.license_plate.clone(),
      identity_card_number: input.identity_card_number.clone(),
    };

    let record = Record {
      record_id:            Uuid::new_v4(),
      code_payload:         payload.encode().map_err(Error::Core)?,
      name:                 input.name,
      license_plate:        input.license_plate,
      identity_card_number: input.identity_card_number,
      created_at:           Utc::now(),
      stages:               Stages::default(),
    };

    let id_str = encode_uuid(record.record_id);
    let name = record.name.clone();
    let plate = record.license_plate.clone();
    let id_number = record.identity_card_number.clone();
    let code_payload = record.code_payload.clone();
    let created_at_str = encode_dt(record.created_at);
    let stages_str = encode_stages(&record.stages)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO records (
             record_id, name, license_plate, identity_card_number,
             code_payload, created_at, stages
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            name,
            plate,
            id_number,
            code_payload,
            created_at_str,
            stages_str
          ],
        )?;
        Ok(())
      })
      .await?;

    self.notify_change().await?;
    Ok(record)
  }

  async fn get(&self, record_id: Uuid) -> Result<Option<Record>> {
    self.query_one(record_id).await
  }

  async fn list(&self) -> Result<Vec<Record>> { self.query_list().await }

  async fn update_stage(
    &self,
    record_id: Uuid,
    stage: StageKey,
    status: StageStatus,
  ) -> Result<()> {
    let mut stages = self.load_stages(record_id).await?;

    // Unconditional overwrite per the store contract: Checked stamps the
    // current time, Pending clears it.
    let new_stage = match status {
      StageStatus::Checked => Stage::Checked { scan_time: Utc::now() },
      StageStatus::Pending => Stage::Pending,
    };
    stages.set(stage, new_stage);

    self.write_stages(record_id, &stages).await?;
    self.notify_change().await
  }

  async fn advance_stage(
    &self,
    record_id: Uuid,
    stage: StageKey,
  ) -> Result<Record> {
    let mut stages = self.load_stages(record_id).await?;
    stages.check(stage, Utc::now())?;

    self.write_stages(record_id, &stages).await?;
    self.notify_change().await?;

    self
      .query_one(record_id)
      .await?
      .ok_or(Error::RecordNotFound(record_id))
  }

  fn subscribe(&self) -> broadcast::Receiver<Vec<Record>> {
    self.changes.subscribe()
  }
}
