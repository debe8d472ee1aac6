//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The stage map is stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use turnstile_core::record::{Record, Stages};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Stages ──────────────────────────────────────────────────────────────────

pub fn encode_stages(stages: &Stages) -> Result<String> {
  Ok(serde_json::to_string(stages)?)
}

pub fn decode_stages(s: &str) -> Result<Stages> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `records` row.
pub struct RawRecord {
  pub record_id:            String,
  pub name:                 String,
  pub license_plate:        String,
  pub identity_card_number: String,
  pub code_payload:         String,
  pub created_at:           String,
  pub stages:               String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<Record> {
    Ok(Record {
      record_id:            decode_uuid(&self.record_id)?,
      name:                 self.name,
      license_plate:        self.license_plate,
      identity_card_number: self.identity_card_number,
      code_payload:         self.code_payload,
      created_at:           decode_dt(&self.created_at)?,
      stages:               decode_stages(&self.stages)?,
    })
  }
}
