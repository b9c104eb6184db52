//! Programme domain model.
//!
//! # Invariants
//! - `name` is non-blank and at most 100 characters.
//! - `id` is assigned by the store and never reused.

use super::ids::ProgrammeId;
use super::validation::{validate_text, ModelValidationError, PROGRAMME_NAME_MAX_CHARS};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An academic course of study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Programme {
    pub id: ProgrammeId,
    pub name: String,
}

impl Programme {
    /// Builds a validated programme record.
    pub fn new(id: ProgrammeId, name: impl Into<String>) -> Result<Self, ModelValidationError> {
        let programme = Self {
            id,
            name: name.into(),
        };
        programme.validate()?;
        Ok(programme)
    }

    /// Checks a candidate programme name.
    pub fn validate_name(name: &str) -> Result<(), ModelValidationError> {
        validate_text("name", name, PROGRAMME_NAME_MAX_CHARS)
    }

    /// Validates all record fields.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        Self::validate_name(&self.name)
    }
}

impl Display for Programme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
