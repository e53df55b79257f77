//! Person domain model and field rules.
//!
//! # Responsibility
//! - Define the canonical person record shared by repository and service.
//! - Keep field validation pure and storage-independent.
//!
//! # Invariants
//! - A person with `id == None` has never been persisted.
//! - `id` and `created_at` are assigned by the store and never rewritten.

pub mod person;
pub mod validation;
