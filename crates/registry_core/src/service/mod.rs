//! Registry use-case services.
//!
//! # Responsibility
//! - Normalize and validate user-facing input before it reaches a store.
//! - Keep CLI/presentation layers decoupled from storage details.

pub mod normalize;
pub mod registry_service;
