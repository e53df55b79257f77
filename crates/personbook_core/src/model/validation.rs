//! Field-level rules for person data.
//!
//! # Responsibility
//! - Check name/email/age before any repository access.
//! - Produce deterministic messages for a given malformed input.
//!
//! # Invariants
//! - Check order is fixed: name, email presence, email format, age.
//! - Nothing here touches storage.

use crate::model::person::PersonId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest accepted age, inclusive.
pub const MIN_AGE: i32 = 0;
/// Highest accepted age, inclusive.
pub const MAX_AGE: i32 = 150;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@(.*\..*)$").expect("valid email regex"));

/// Malformed input detected before storage access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    EmptyEmail,
    InvalidEmail,
    AgeOutOfRange(i32),
    InvalidId(PersonId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::EmptyEmail => write!(f, "Email cannot be empty"),
            Self::InvalidEmail => write!(f, "Invalid email format"),
            Self::AgeOutOfRange(_) => write!(f, "Age must be between {MIN_AGE} and {MAX_AGE}"),
            Self::InvalidId(_) => write!(f, "Invalid user ID"),
        }
    }
}

impl Error for ValidationError {}

/// Validates the three mutable person fields in fixed order.
pub fn validate_person_fields(
    name: &str,
    email: &str,
    age: Option<i32>,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    validate_email_present(email)?;
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    validate_age(age)
}

/// Rejects blank email input.
pub fn validate_email_present(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    Ok(())
}

/// Rejects ages outside `MIN_AGE..=MAX_AGE`. `None` is always accepted.
pub fn validate_age(age: Option<i32>) -> Result<(), ValidationError> {
    match age {
        Some(value) if !(MIN_AGE..=MAX_AGE).contains(&value) => {
            Err(ValidationError::AgeOutOfRange(value))
        }
        _ => Ok(()),
    }
}

/// Rejects non-positive ids.
pub fn validate_person_id(id: PersonId) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::InvalidId(id));
    }
    Ok(())
}

/// Returns whether `email` matches `local-part@domain` with a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
