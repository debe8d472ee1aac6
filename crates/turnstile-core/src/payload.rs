//! The code payload — the serialized identity triple embedded in the
//! scannable code.
//!
//! A flat JSON object with exactly the keys `name`, `license_plate`, and
//! `identity_card_number`, each a string. No version tag, framing, or
//! checksum is added beyond what the QR format itself provides.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodePayload {
  pub name:                 String,
  pub license_plate:        String,
  pub identity_card_number: String,
}

impl CodePayload {
  /// Serialize for embedding in a code. Deterministic for a given triple.
  pub fn encode(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  /// Parse raw decoded scan text.
  ///
  /// Structural validation only: the text must be a well-formed payload
  /// object and all three fields must be non-empty. Decode errors are
  /// expected per-frame noise in a continuous scan stream and are never
  /// fatal to the scanner.
  pub fn decode(text: &str) -> Result<Self> {
    let payload: CodePayload = serde_json::from_str(text)
      .map_err(|e| Error::InvalidCodePayload(e.to_string()))?;

    if payload.name.is_empty()
      || payload.license_plate.is_empty()
      || payload.identity_card_number.is_empty()
    {
      return Err(Error::InvalidCodePayload(
        "missing or empty identity field".into(),
      ));
    }
    Ok(payload)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn payload() -> CodePayload {
    CodePayload {
      name:                 "John Doe".into(),
      license_plate:        "ABC123".into(),
      identity_card_number: "1234567890".into(),
    }
  }

  #[test]
  fn encode_decode_roundtrip() {
    let text = payload().encode().unwrap();
    let decoded = CodePayload::decode(&text).unwrap();
    assert_eq!(decoded, payload());
  }

  #[test]
  fn decode_rejects_non_json() {
    let err = CodePayload::decode("not a payload").unwrap_err();
    assert!(matches!(err, Error::InvalidCodePayload(_)));
  }

  #[test]
  fn decode_rejects_missing_field() {
    let err =
      CodePayload::decode(r#"{"name":"John Doe","license_plate":"ABC123"}"#)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCodePayload(_)));
  }

  #[test]
  fn decode_rejects_empty_field() {
    let text = r#"{"name":"","license_plate":"ABC123","identity_card_number":"1234567890"}"#;
    let err = CodePayload::decode(text).unwrap_err();
    assert!(matches!(err, Error::InvalidCodePayload(_)));
  }

  #[test]
  fn decode_rejects_extra_keys() {
    let text = r#"{"name":"John Doe","license_plate":"ABC123","identity_card_number":"1234567890","version":2}"#;
    let err = CodePayload::decode(text).unwrap_err();
    assert!(matches!(err, Error::InvalidCodePayload(_)));
  }
}
