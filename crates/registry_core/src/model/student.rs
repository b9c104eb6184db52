//! Student domain model.
//!
//! # Responsibility
//! - Define the enrolled-student record and its display form.
//!
//! # Invariants
//! - `student_id` is non-blank, at most 20 characters, globally unique.
//! - `name` is non-blank and at most 100 characters.
//! - `programme_id` references an existing programme (enforced by stores).

use super::ids::{ProgrammeId, StudentKey};
use super::validation::{
    validate_text, ModelValidationError, STUDENT_ID_MAX_CHARS, STUDENT_NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A person enrolled in exactly one programme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Store-assigned row identity.
    pub id: StudentKey,
    /// Institutional identifier, e.g. `S001`.
    pub student_id: String,
    pub name: String,
    pub programme_id: ProgrammeId,
}

impl Student {
    /// Builds a validated student record.
    pub fn new(
        id: StudentKey,
        student_id: impl Into<String>,
        name: impl Into<String>,
        programme_id: ProgrammeId,
    ) -> Result<Self, ModelValidationError> {
        let student = Self {
            id,
            student_id: student_id.into(),
            name: name.into(),
            programme_id,
        };
        student.validate()?;
        Ok(student)
    }

    pub fn validate_student_id(student_id: &str) -> Result<(), ModelValidationError> {
        validate_text("student_id", student_id, STUDENT_ID_MAX_CHARS)
    }

    pub fn validate_name(name: &str) -> Result<(), ModelValidationError> {
        validate_text("name", name, STUDENT_NAME_MAX_CHARS)
    }

    /// Validates all text fields. Referential checks belong to stores.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        Self::validate_student_id(&self.student_id)?;
        Self::validate_name(&self.name)
    }
}

impl Display for Student {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.student_id)
    }
}
