//! Core domain logic for the student-programme registry.
//! This crate is the single source of truth for registry invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::ids::{ProgrammeId, StudentKey};
pub use model::programme::Programme;
pub use model::student::Student;
pub use model::validation::ModelValidationError;
pub use repo::memory_store::InMemoryRegistryStore;
pub use repo::registry_store::{
    CascadeSummary, ErrorKind, RegistryStore, StoreError, StoreResult, StudentChanges,
};
pub use repo::sqlite_store::SqliteRegistryStore;
pub use repo::student_cursor::{StudentsByProgramme, DEFAULT_PAGE_SIZE};
pub use service::registry_service::{RegistryError, RegistryResult, RegistryService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
