//! Store contract, error taxonomy and shared request types.
//!
//! # Responsibility
//! - Declare the operations every registry backend must provide.
//! - Classify failures into stable `ErrorKind`s.
//!
//! # Invariants
//! - `create_student` checks run in order: validation, programme
//!   existence, `student_id` uniqueness.
//! - `delete_programme` removes the programme and all of its students as
//!   one atomic step.

use crate::db::DbError;
use crate::model::ids::{ProgrammeId, StudentKey};
use crate::model::programme::Programme;
use crate::model::student::Student;
use crate::model::validation::ModelValidationError;
use crate::repo::student_cursor::StudentsByProgramme;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Stable classification of registry failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input; caller can fix and retry.
    Validation,
    /// Reference to an id that does not exist.
    NotFound,
    /// Uniqueness violation.
    Conflict,
    /// Backend failure (SQLite, corrupt rows, schema mismatch, poisoned lock).
    Storage,
}

impl ErrorKind {
    /// Snake-case code used in logs and CLI output.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage_error",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors from registry store operations.
#[derive(Debug)]
pub enum StoreError {
    /// A field failed model validation.
    Validation(ModelValidationError),
    ProgrammeNotFound(ProgrammeId),
    StudentNotFound(StudentKey),
    /// No student carries this institutional id.
    StudentIdNotFound(String),
    /// Institutional student id is already taken.
    DuplicateStudentId(String),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Connection does not enforce foreign keys, so cascades would not run.
    ForeignKeysDisabled,
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ProgrammeNotFound(_) | Self::StudentNotFound(_) | Self::StudentIdNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::DuplicateStudentId(_) => ErrorKind::Conflict,
            Self::Db(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::ForeignKeysDisabled
            | Self::Poisoned => ErrorKind::Storage,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProgrammeNotFound(id) => write!(f, "programme not found: {id}"),
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::StudentIdNotFound(student_id) => {
                write!(f, "no student with student_id `{student_id}`")
            }
            Self::DuplicateStudentId(student_id) => {
                write!(f, "student_id `{student_id}` is already registered")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted registry data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "registry store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "registry store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "registry store requires column `{column}` in table `{table}`"
            ),
            Self::ForeignKeysDisabled => {
                write!(f, "registry store requires `PRAGMA foreign_keys = ON`")
            }
            Self::Poisoned => write!(f, "registry store lock poisoned by a panicked writer"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for StoreError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Partial update for one student. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    pub name: Option<String>,
    /// Target programme for a transfer.
    pub programme_id: Option<ProgrammeId>,
}

impl StudentChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.programme_id.is_none()
    }
}

/// Outcome of a cascading programme delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeSummary {
    /// The programme as it was just before removal.
    pub programme: Programme,
    /// Number of students removed together with it.
    pub students_removed: u64,
}

/// Repository interface for programme and student storage.
pub trait RegistryStore {
    /// Creates one programme with a fresh id.
    fn create_programme(&self, name: &str) -> StoreResult<Programme>;
    /// Replaces one programme's name.
    fn rename_programme(&self, id: ProgrammeId, name: &str) -> StoreResult<Programme>;
    /// Loads one programme by id.
    fn get_programme(&self, id: ProgrammeId) -> StoreResult<Programme>;
    /// Lists all programmes ordered by id.
    fn list_programmes(&self) -> StoreResult<Vec<Programme>>;
    /// Lists programmes whose name equals `name` exactly, ordered by id.
    fn find_programmes_by_name(&self, name: &str) -> StoreResult<Vec<Programme>>;
    /// Deletes one programme and cascades to its students.
    fn delete_programme(&self, id: ProgrammeId) -> StoreResult<CascadeSummary>;
    /// Counts students enrolled in one programme.
    fn count_students(&self, programme_id: ProgrammeId) -> StoreResult<u64>;

    /// Creates one student enrolled in an existing programme.
    fn create_student(
        &self,
        student_id: &str,
        name: &str,
        programme_id: ProgrammeId,
    ) -> StoreResult<Student>;
    /// Renames and/or transfers one student.
    fn update_student(&self, id: StudentKey, changes: &StudentChanges) -> StoreResult<Student>;
    /// Loads one student by row id.
    fn get_student(&self, id: StudentKey) -> StoreResult<Student>;
    /// Loads one student by institutional id.
    fn find_student_by_student_id(&self, student_id: &str) -> StoreResult<Student>;
    /// Deletes one student.
    fn delete_student(&self, id: StudentKey) -> StoreResult<()>;

    /// Loads up to `limit` students of one programme with id greater than
    /// `after`, in ascending id order.
    ///
    /// Fails with `ProgrammeNotFound` when the programme is absent.
    fn student_page(
        &self,
        programme_id: ProgrammeId,
        after: Option<StudentKey>,
        limit: usize,
    ) -> StoreResult<Vec<Student>>;

    /// Returns a lazy, restartable cursor over one programme's students.
    ///
    /// Existence is checked now; pages are fetched while iterating.
    fn list_students_by_programme(
        &self,
        programme_id: ProgrammeId,
    ) -> StoreResult<StudentsByProgramme<'_, Self>>
    where
        Self: Sized,
    {
        self.get_programme(programme_id)?;
        Ok(StudentsByProgramme::new(self, programme_id))
    }
}
