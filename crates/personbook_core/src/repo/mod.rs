//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow person data access contract.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Every repository call runs in its own unit of work.
//! - Absence on lookup is `Ok(None)`, never an error.

pub mod person_repo;
