//! Record identifiers.
//!
//! # Responsibility
//! - Give programmes and students distinct id types so they cannot be mixed.
//! - Parse user-supplied id text before it reaches a store.
//!
//! # Invariants
//! - Ids are strictly positive; `0` and negatives are unrepresentable.
//! - Text form is the plain decimal integer.

use super::validation::ModelValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw value, rejecting non-positive integers.
            pub fn new(value: i64) -> Result<Self, ModelValidationError> {
                if value <= 0 {
                    return Err(ModelValidationError::InvalidIdentifier {
                        field: $field,
                        value: value.to_string(),
                    });
                }
                Ok(Self(value))
            }

            /// Parses trimmed decimal text.
            pub fn parse(text: &str) -> Result<Self, ModelValidationError> {
                let trimmed = text.trim();
                let invalid = || ModelValidationError::InvalidIdentifier {
                    field: $field,
                    value: trimmed.to_string(),
                };
                if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
                    return Err(invalid());
                }
                let value = trimmed.parse::<i64>().map_err(|_| invalid())?;
                Self::new(value).map_err(|_| invalid())
            }

            /// Returns the raw integer value.
            pub fn get(self) -> i64 {
                self.0
            }

            /// First id issued by a fresh store.
            pub(crate) fn first() -> Self {
                Self(1)
            }

            /// Successor in a store's monotonic sequence.
            pub(crate) fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelValidationError;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                Self::parse(text)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ModelValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

record_id!(
    /// Stable identifier of a programme row.
    ProgrammeId,
    "programme_id"
);

record_id!(
    /// Stable identifier of a student row.
    ///
    /// Distinct from the institutional `Student::student_id` text.
    StudentKey,
    "student_key"
);

#[cfg(test)]
mod tests {
    use super::{ProgrammeId, StudentKey};
    use crate::model::validation::ModelValidationError;

    #[test]
    fn parse_accepts_padded_decimal() {
        assert_eq!(ProgrammeId::parse(" 42 ").unwrap().get(), 42);
        assert_eq!("7".parse::<StudentKey>().unwrap().get(), 7);
    }

    #[test]
    fn parse_rejects_non_positive_and_garbage() {
        for text in ["", "0", "-1", "+3", "abc", "1.5", "99999999999999999999"] {
            let err = ProgrammeId::parse(text).unwrap_err();
            assert!(
                matches!(
                    err,
                    ModelValidationError::InvalidIdentifier {
                        field: "programme_id",
                        ..
                    }
                ),
                "`{text}` should be rejected"
            );
        }
    }

    #[test]
    fn display_is_plain_integer() {
        assert_eq!(StudentKey::new(12).unwrap().to_string(), "12");
    }
}
