//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person record persisted by the repository.
//! - Provide identity comparison based on the store-assigned id.
//!
//! # Invariants
//! - `id` is `None` until the repository create call assigns it.
//! - `created_at` is audit-only and never participates in identity.
//! - `age`, when present, stays within `0..=150` (see `validation`).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-generated surrogate identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PersonId = i64;

/// Canonical person profile record.
///
/// `==` compares every field, `created_at` included. Record identity is
/// `is_same_record`, which looks at `id` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Assigned on first persistence, immutable afterward.
    pub id: Option<PersonId>,
    /// Display name. Never blank once validated.
    pub name: String,
    /// Contact address. Unique across all persisted persons.
    pub email: String,
    /// Optional age in years.
    pub age: Option<i32>,
    /// Unix epoch milliseconds with whole-second granularity. Set by the store
    /// at insert time.
    pub created_at: Option<i64>,
}

impl Person {
    /// Creates an unpersisted person.
    ///
    /// # Invariants
    /// - `id` and `created_at` start as `None`.
    /// - This constructor does not validate fields.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: Option<i32>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            age,
            created_at: None,
        }
    }

    /// Returns whether this person has been assigned a store id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns whether both values refer to the same persisted record.
    ///
    /// Two unpersisted persons are never the same record, even when all
    /// fields match.
    pub fn is_same_record(&self, other: &Person) -> bool {
        matches!((self.id, other.id), (Some(left), Some(right)) if left == right)
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "Person{{id={id}")?,
            None => write!(f, "Person{{id=none")?,
        }
        write!(f, ", name='{}', email='{}'", self.name, self.email)?;
        match self.age {
            Some(age) => write!(f, ", age={age}")?,
            None => write!(f, ", age=none")?,
        }
        match self.created_at {
            Some(created_at) => write!(f, ", created_at={created_at}}}"),
            None => write!(f, ", created_at=none}}"),
        }
    }
}
