//! Person use-case service.
//!
//! # Responsibility
//! - Provide the public create/read/list/update/delete entry points.
//! - Validate input and enforce email uniqueness before any write.
//! - Map repository outcomes to typed domain errors.
//!
//! # Invariants
//! - Validation runs before the first repository call of every operation.
//! - Domain failures are never retried and never swallowed.
//! - The service holds no state between calls.

use crate::model::person::{Person, PersonId};
use crate::model::validation::{
    validate_email_present, validate_person_fields, validate_person_id, ValidationError,
};
use crate::repo::person_repo::{PersonRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Key used for a lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonLookup {
    Id(PersonId),
    Email(String),
}

/// Service error for person use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before storage access.
    Validation(ValidationError),
    /// Another person already holds this email.
    EmailAlreadyExists(String),
    /// No person matches the given id or email.
    NotFound(PersonLookup),
    /// Store failure, propagated unchanged.
    Storage(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EmailAlreadyExists(email) => write!(f, "Email already exists: {email}"),
            Self::NotFound(PersonLookup::Id(id)) => write!(f, "Person not found with id: {id}"),
            Self::NotFound(PersonLookup::Email(email)) => {
                write!(f, "Person not found with email: {email}")
            }
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(PersonLookup::Id(id)),
            RepoError::EmailTaken(email) => Self::EmailAlreadyExists(email),
            other => Self::Storage(other),
        }
    }
}

/// Person service facade over repository implementations.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one person after validation and an email uniqueness check.
    ///
    /// # Contract
    /// - Never calls repository `create` when the email is already held.
    /// - A concurrent writer that wins the race still yields
    ///   `EmailAlreadyExists`, via the store's unique constraint.
    pub fn create_person(
        &self,
        name: &str,
        email: &str,
        age: Option<i32>,
    ) -> ServiceResult<Person> {
        info!("event=person_create module=service status=start");
        validate_person_fields(name, email, age)?;

        if self.repo.exists_by_email(email)? {
            warn!("event=person_create module=service status=rejected error_code=email_exists");
            return Err(ServiceError::EmailAlreadyExists(email.to_string()));
        }

        let person = Person::new(name, email, age);
        Ok(self.repo.create(&person)?)
    }

    /// Gets one person by id.
    pub fn get_by_id(&self, id: PersonId) -> ServiceResult<Person> {
        info!("event=person_get module=service status=start id={id}");
        validate_person_id(id)?;

        self.repo
            .find_by_id(id)?
            .ok_or(ServiceError::NotFound(PersonLookup::Id(id)))
    }

    /// Lists every stored person in storage order.
    pub fn list_all(&self) -> ServiceResult<Vec<Person>> {
        info!("event=person_list module=service status=start");
        Ok(self.repo.find_all()?)
    }

    /// Replaces name/email/age of an existing person.
    ///
    /// # Contract
    /// - `exists_by_email` is consulted only when the email changes.
    /// - `id` and `created_at` are carried over from the stored record.
    pub fn update_person(
        &self,
        id: PersonId,
        name: &str,
        email: &str,
        age: Option<i32>,
    ) -> ServiceResult<Person> {
        info!("event=person_update module=service status=start id={id}");
        validate_person_fields(name, email, age)?;

        let mut person = self.get_by_id(id)?;

        if person.email != email && self.repo.exists_by_email(email)? {
            warn!(
                "event=person_update module=service status=rejected id={id} error_code=email_exists"
            );
            return Err(ServiceError::EmailAlreadyExists(email.to_string()));
        }

        person.name = name.to_string();
        person.email = email.to_string();
        person.age = age;

        Ok(self.repo.update(&person)?)
    }

    /// Deletes one person by id.
    ///
    /// Existence is confirmed first so a missing id surfaces as `NotFound`
    /// before any delete is attempted.
    pub fn delete_person(&self, id: PersonId) -> ServiceResult<()> {
        info!("event=person_delete module=service status=start id={id}");
        validate_person_id(id)?;

        self.get_by_id(id)?;
        Ok(self.repo.delete(id)?)
    }

    /// Gets one person by exact email.
    pub fn get_by_email(&self, email: &str) -> ServiceResult<Person> {
        info!("event=person_get_by_email module=service status=start");
        validate_email_present(email)?;

        self.repo
            .find_by_email(email)?
            .ok_or_else(|| ServiceError::NotFound(PersonLookup::Email(email.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::{PersonLookup, ServiceError};
    use crate::db::DbError;
    use crate::model::validation::ValidationError;
    use crate::repo::person_repo::RepoError;

    #[test]
    fn messages_match_user_facing_wording() {
        assert_eq!(
            ServiceError::EmailAlreadyExists("test@example.com".to_string()).to_string(),
            "Email already exists: test@example.com"
        );
        assert_eq!(
            ServiceError::NotFound(PersonLookup::Id(1)).to_string(),
            "Person not found with id: 1"
        );
        assert_eq!(
            ServiceError::NotFound(PersonLookup::Email("a@b.com".to_string())).to_string(),
            "Person not found with email: a@b.com"
        );
        assert_eq!(
            ServiceError::from(ValidationError::EmptyName).to_string(),
            "Name cannot be empty"
        );
    }

    #[test]
    fn repo_errors_map_to_domain_errors() {
        assert!(matches!(
            ServiceError::from(RepoError::NotFound(4)),
            ServiceError::NotFound(PersonLookup::Id(4))
        ));
        assert!(matches!(
            ServiceError::from(RepoError::EmailTaken("x@y.com".to_string())),
            ServiceError::EmailAlreadyExists(email) if email == "x@y.com"
        ));
        assert!(matches!(
            ServiceError::from(RepoError::StaleRecord(9)),
            ServiceError::Storage(RepoError::StaleRecord(9))
        ));
        assert!(matches!(
            ServiceError::from(RepoError::Db(DbError::UnsupportedSchemaVersion {
                db_version: 2,
                latest_supported: 1,
            })),
            ServiceError::Storage(RepoError::Db(_))
        ));
    }
}
