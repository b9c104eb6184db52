//! Registry domain model.
//!
//! # Responsibility
//! - Define the canonical `Programme` and `Student` records.
//! - Own field-level validation shared by every store backend.
//!
//! # Invariants
//! - Every record is identified by a positive, never-reused integer id.
//! - A `Student` always names exactly one `Programme` through `programme_id`.

pub mod ids;
pub mod programme;
pub mod student;
pub mod validation;
