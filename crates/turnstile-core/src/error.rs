//! Error types for `turnstile-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::record::StageKey;

#[derive(Debug, Error)]
pub enum Error {
  /// A scanned payload matched no record's identity triple.
  #[error("scanned code does not match any record")]
  NoMatchingRecord,

  /// A scanned payload matched a record whose three stages are all checked.
  #[error("all stages are already complete for record {record_id}")]
  AllStagesComplete { record_id: Uuid },

  /// Guarded transition refused: the stage is already checked.
  #[error("stage {stage} is already checked")]
  StageAlreadyChecked { stage: StageKey },

  /// Decoded scan text is not a well-formed payload, or an identity field
  /// is missing or empty.
  #[error("invalid code payload: {0}")]
  InvalidCodePayload(String),

  #[error("validation failed for {field}: {reason}")]
  ValidationFailed {
    field:  &'static str,
    reason: &'static str,
  },

  #[error("record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
