//! Field validation and input coercion for the registration form.
//!
//! Validation answers "may this be submitted?"; coercion is applied to raw
//! keyboard input as the user types (uppercase, strip disallowed characters,
//! cap the length) so most invalid input never reaches validation.

use lazy_static::lazy_static;
use regex::Regex;

/// Maximum typed length of a license plate (`ABC-123`).
pub const LICENSE_PLATE_MAX: usize = 7;
/// Maximum typed length of an identity-card number.
pub const IDENTITY_CARD_MAX: usize = 10;

pub const NAME_RULE: &str =
  "at least 2 characters, letters and whitespace only";
pub const LICENSE_PLATE_RULE: &str = "format: ABC-123 or ABC123";
pub const IDENTITY_CARD_RULE: &str = "must be exactly 10 digits";

// ─── Validation ──────────────────────────────────────────────────────────────

/// Name: length ≥ 2, letters and whitespace only.
pub fn is_valid_name(value: &str) -> bool {
  lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Z\s]*$").unwrap();
  }
  value.chars().count() >= 2 && NAME_RE.is_match(value)
}

/// License plate: three uppercase letters, an optional `-`, three digits.
pub fn is_valid_license_plate(value: &str) -> bool {
  lazy_static! {
    static ref PLATE_RE: Regex = Regex::new(r"^[A-Z]{3}-?\d{3}$").unwrap();
  }
  PLATE_RE.is_match(&value.to_uppercase())
}

/// Identity card number: exactly 10 digits.
pub fn is_valid_identity_card(value: &str) -> bool {
  lazy_static! {
    static ref ID_RE: Regex = Regex::new(r"^\d{10}$").unwrap();
  }
  ID_RE.is_match(value)
}

// ─── Input coercion ──────────────────────────────────────────────────────────

/// Strip everything except letters and whitespace.
pub fn coerce_name(input: &str) -> String {
  input
    .chars()
    .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
    .collect()
}

/// Uppercase, strip characters outside `[A-Z0-9-]`, cap at
/// [`LICENSE_PLATE_MAX`].
pub fn coerce_license_plate(input: &str) -> String {
  input
    .to_uppercase()
    .chars()
    .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-')
    .take(LICENSE_PLATE_MAX)
    .collect()
}

/// Strip non-digits, cap at [`IDENTITY_CARD_MAX`].
pub fn coerce_identity_card(input: &str) -> String {
  input
    .chars()
    .filter(|c| c.is_ascii_digit())
    .take(IDENTITY_CARD_MAX)
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_rules() {
    assert!(is_valid_name("John Doe"));
    assert!(is_valid_name("Jo"));
    assert!(!is_valid_name("J"));
    assert!(!is_valid_name("John1"));
    assert!(!is_valid_name(""));
  }

  #[test]
  fn license_plate_rules() {
    assert!(is_valid_license_plate("ABC123"));
    assert!(is_valid_license_plate("ABC-123"));
    // Lowercase is coerced before matching; the digit count is still wrong.
    assert!(!is_valid_license_plate("abc12"));
    assert!(!is_valid_license_plate("AB-1234"));
    assert!(!is_valid_license_plate("ABCD123"));
  }

  #[test]
  fn identity_card_rules() {
    assert!(is_valid_identity_card("1234567890"));
    assert!(!is_valid_identity_card("12345"));
    assert!(!is_valid_identity_card("12345678901"));
    assert!(!is_valid_identity_card("12345abc90"));
  }

  #[test]
  fn coercion_strips_and_caps() {
    assert_eq!(coerce_name("John3 Doe!"), "John Doe");
    assert_eq!(coerce_license_plate("abc-123xyz"), "ABC-123");
    assert_eq!(coerce_license_plate("ab c*1"), "ABC1");
    assert_eq!(coerce_identity_card("12a34-567890123"), "1234567890");
  }
}
