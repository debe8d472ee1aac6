//! SQL schema for the turnstile SQLite store.
//!
//! Applied on every connection open; `PRAGMA user_version` marks the schema
//! revision so later migrations can gate on it.

/// Full schema DDL, safe to re-run against an existing database.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per registered user. Identity fields and code_payload are fixed
-- at creation; only the stages column is ever updated.
CREATE TABLE IF NOT EXISTS records (
    record_id            TEXT PRIMARY KEY,
    name                 TEXT NOT NULL,
    license_plate        TEXT NOT NULL,
    identity_card_number TEXT NOT NULL,
    code_payload         TEXT NOT NULL,   -- serialized identity triple
    created_at           TEXT NOT NULL,   -- ISO 8601 UTC; store-assigned
    stages               TEXT NOT NULL    -- JSON map '1'|'2'|'3' -> stage
);

CREATE INDEX IF NOT EXISTS records_created_idx ON records(created_at);

PRAGMA user_version = 1;
";
