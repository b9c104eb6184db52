//! Identifier and referential store.
//!
//! # Responsibility
//! - Define the `RegistryStore` contract shared by every backend.
//! - Hold canonical programme/student state and enforce uniqueness,
//!   referential integrity and cascade delete.
//!
//! # Invariants
//! - Store writes validate records before persistence.
//! - No reader ever observes a student whose programme is gone.
//! - Store APIs return semantic errors (`*NotFound`, `DuplicateStudentId`)
//!   in addition to backend transport errors.

pub mod memory_store;
pub mod registry_store;
pub mod sqlite_store;
pub mod student_cursor;
