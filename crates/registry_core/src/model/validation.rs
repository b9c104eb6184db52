//! Field validation rules for registry records.
//!
//! # Invariants
//! - Lengths are counted in Unicode scalar values, not bytes.
//! - Blank (empty or whitespace-only) text is always rejected.
//! - Control characters (`\0`, tabs, newlines, ...) are never stored, so
//!   SQLite's `length`/`trim` see the same text Rust does.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum programme name length.
pub const PROGRAMME_NAME_MAX_CHARS: usize = 100;
/// Maximum institutional student id length.
pub const STUDENT_ID_MAX_CHARS: usize = 20;
/// Maximum student name length.
pub const STUDENT_NAME_MAX_CHARS: usize = 100;

/// Validation failures for registry fields and identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Field is empty or whitespace-only.
    EmptyField(&'static str),
    /// Field contains a control character.
    ControlCharacter(&'static str),
    /// Field exceeds its character limit.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Text is not a positive decimal record identifier.
    InvalidIdentifier { field: &'static str, value: String },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::ControlCharacter(field) => {
                write!(f, "{field} must not contain control characters")
            }
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} must be at most {max} characters, got {actual}")
            }
            Self::InvalidIdentifier { field, value } => {
                write!(f, "{field} is not a valid identifier: `{value}`")
            }
        }
    }
}

impl Error for ModelValidationError {}

/// Checks one text field against blank, control-character and length rules.
pub fn validate_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyField(field));
    }
    if value.chars().any(char::is_control) {
        return Err(ModelValidationError::ControlCharacter(field));
    }

    let actual = value.chars().count();
    if actual > max_chars {
        return Err(ModelValidationError::TooLong {
            field,
            max: max_chars,
            actual,
        });
    }

    Ok(())
}
