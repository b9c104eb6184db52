//! Registry facade over a `RegistryStore`.
//!
//! # Responsibility
//! - Accept raw user input (text ids, untrimmed names) and normalize it.
//! - Reject syntactically invalid ids before any store access.
//! - Translate store failures into `RegistryError` without changing kind.
//!
//! # Invariants
//! - `RegistryError::kind()` always equals the kind of the underlying
//!   store error; the facade only adds the operation name as context.
//! - Mutations emit one `event=<operation> module=registry` log line.

use crate::model::ids::{ProgrammeId, StudentKey};
use crate::model::programme::Programme;
use crate::model::student::Student;
use crate::model::validation::ModelValidationError;
use crate::repo::registry_store::{
    CascadeSummary, ErrorKind, RegistryStore, StoreError, StoreResult, StudentChanges,
};
use crate::repo::student_cursor::StudentsByProgramme;
use crate::service::normalize::{normalize_name, normalize_student_id};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors surfaced by the registry facade.
#[derive(Debug)]
pub enum RegistryError {
    /// Input rejected by the facade before reaching the store.
    InvalidInput {
        operation: &'static str,
        source: ModelValidationError,
    },
    /// Store-level failure, tagged with the facade operation.
    Store {
        operation: &'static str,
        source: StoreError,
    },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::Validation,
            Self::Store { source, .. } => source.kind(),
        }
    }

    /// Stable snake-case code, see `ErrorKind::code`.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Facade operation that failed, e.g. `student_create`.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::InvalidInput { operation, .. } | Self::Store { operation, .. } => *operation,
        }
    }

    /// Underlying store error, when the failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::InvalidInput { .. } => None,
            Self::Store { source, .. } => Some(source),
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { operation, source } => write!(f, "{operation}: {source}"),
            Self::Store { operation, source } => write!(f, "{operation}: {source}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput { source, .. } => Some(source),
            Self::Store { source, .. } => Some(source),
        }
    }
}

/// Validated, user-facing registry operations.
pub struct RegistryService<S: RegistryStore> {
    store: S,
}

impl<S: RegistryStore> RegistryService<S> {
    /// Creates a facade that owns `store` until dropped.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Releases the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Human-readable programme rendering for display collaborators.
    pub fn render_programme(programme: &Programme) -> String {
        programme.to_string()
    }

    /// Human-readable student rendering: `"{name} ({student_id})"`.
    pub fn render_student(student: &Student) -> String {
        student.to_string()
    }

    pub fn create_programme(&self, name: &str) -> RegistryResult<Programme> {
        const OP: &str = "programme_create";
        let name = normalize_name(name);
        let programme = run(OP, self.store.create_programme(&name))?;
        info!(
            "event={OP} module=registry status=ok programme_id={}",
            programme.id
        );
        Ok(programme)
    }

    pub fn rename_programme(&self, id: &str, name: &str) -> RegistryResult<Programme> {
        const OP: &str = "programme_rename";
        let id = parse_programme_id(OP, id)?;
        let name = normalize_name(name);
        let programme = run(OP, self.store.rename_programme(id, &name))?;
        info!("event={OP} module=registry status=ok programme_id={id}");
        Ok(programme)
    }

    pub fn get_programme(&self, id: &str) -> RegistryResult<Programme> {
        const OP: &str = "programme_get";
        let id = parse_programme_id(OP, id)?;
        run(OP, self.store.get_programme(id))
    }

    pub fn list_programmes(&self) -> RegistryResult<Vec<Programme>> {
        run("programme_list", self.store.list_programmes())
    }

    /// Looks up programmes by exact (normalized) name.
    pub fn find_programmes_by_name(&self, name: &str) -> RegistryResult<Vec<Programme>> {
        let name = normalize_name(name);
        run("programme_find", self.store.find_programmes_by_name(&name))
    }

    /// Deletes a programme together with every enrolled student.
    pub fn delete_programme(&self, id: &str) -> RegistryResult<CascadeSummary> {
        const OP: &str = "programme_delete";
        let id = parse_programme_id(OP, id)?;
        let summary = run(OP, self.store.delete_programme(id))?;
        info!(
            "event={OP} module=registry status=ok programme_id={id} cascade_students={}",
            summary.students_removed
        );
        Ok(summary)
    }

    pub fn count_students(&self, programme_id: &str) -> RegistryResult<u64> {
        const OP: &str = "programme_count_students";
        let programme_id = parse_programme_id(OP, programme_id)?;
        run(OP, self.store.count_students(programme_id))
    }

    pub fn create_student(
        &self,
        student_id: &str,
        name: &str,
        programme_id: &str,
    ) -> RegistryResult<Student> {
        const OP: &str = "student_create";
        let programme_id = parse_programme_id(OP, programme_id)?;
        let student_id = normalize_student_id(student_id);
        let name = normalize_name(name);
        let student = run(
            OP,
            self.store.create_student(&student_id, &name, programme_id),
        )?;
        info!(
            "event={OP} module=registry status=ok student_key={} programme_id={programme_id}",
            student.id
        );
        Ok(student)
    }

    /// Renames and/or transfers a student. `None` keeps the current value.
    pub fn update_student(
        &self,
        id: &str,
        name: Option<&str>,
        programme_id: Option<&str>,
    ) -> RegistryResult<Student> {
        const OP: &str = "student_update";
        let id = parse_student_key(OP, id)?;
        let changes = StudentChanges {
            name: name.map(normalize_name),
            programme_id: programme_id
                .map(|value| parse_programme_id(OP, value))
                .transpose()?,
        };
        let student = run(OP, self.store.update_student(id, &changes))?;
        info!(
            "event={OP} module=registry status=ok student_key={id} programme_id={}",
            student.programme_id
        );
        Ok(student)
    }

    pub fn get_student(&self, id: &str) -> RegistryResult<Student> {
        const OP: &str = "student_get";
        let id = parse_student_key(OP, id)?;
        run(OP, self.store.get_student(id))
    }

    /// Looks up a student by institutional id, e.g. `S001`.
    pub fn find_student_by_student_id(&self, student_id: &str) -> RegistryResult<Student> {
        const OP: &str = "student_lookup";
        let student_id = normalize_student_id(student_id);
        if let Err(err) = Student::validate_student_id(&student_id) {
            return Err(reject(OP, err));
        }
        run(OP, self.store.find_student_by_student_id(&student_id))
    }

    pub fn delete_student(&self, id: &str) -> RegistryResult<()> {
        const OP: &str = "student_delete";
        let id = parse_student_key(OP, id)?;
        run(OP, self.store.delete_student(id))?;
        info!("event={OP} module=registry status=ok student_key={id}");
        Ok(())
    }

    /// Returns a lazy, restartable cursor over one programme's students.
    ///
    /// Items carry `StoreError`s; their `kind()` matches the facade's.
    pub fn list_students_by_programme(
        &self,
        programme_id: &str,
    ) -> RegistryResult<StudentsByProgramme<'_, S>> {
        const OP: &str = "student_list";
        let programme_id = parse_programme_id(OP, programme_id)?;
        run(OP, self.store.list_students_by_programme(programme_id))
    }

    /// Collects one programme's students, mapping cursor errors.
    pub fn roster(&self, programme_id: &str) -> RegistryResult<Vec<Student>> {
        const OP: &str = "student_list";
        self.list_students_by_programme(programme_id)?
            .map(|item| run(OP, item))
            .collect()
    }
}

fn run<T>(operation: &'static str, result: StoreResult<T>) -> RegistryResult<T> {
    match result {
        Ok(value) => {
            debug!("event={operation} module=registry status=ok");
            Ok(value)
        }
        Err(source) => {
            warn!(
                "event={operation} module=registry status=error error_code={} error={source}",
                source.kind().code()
            );
            Err(RegistryError::Store { operation, source })
        }
    }
}

fn reject(operation: &'static str, source: ModelValidationError) -> RegistryError {
    warn!(
        "event={operation} module=registry status=error error_code={} error={source}",
        ErrorKind::Validation.code()
    );
    RegistryError::InvalidInput { operation, source }
}

fn parse_programme_id(operation: &'static str, value: &str) -> RegistryResult<ProgrammeId> {
    ProgrammeId::parse(value).map_err(|err| reject(operation, err))
}

fn parse_student_key(operation: &'static str, value: &str) -> RegistryResult<StudentKey> {
    StudentKey::parse(value).map_err(|err| reject(operation, err))
}
