//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD plus email lookup over the `persons` table.
//! - Translate store-level unique violations on `email` into `EmailTaken`.
//!
//! # Invariants
//! - One call, one unit of work; no call shares a transaction with another.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `id` and `created_at` are never written by `update`.
//! - `created_at` is epoch milliseconds truncated to whole seconds.

use crate::db::{Database, DbError, TransactionBehavior};
use crate::model::person::{Person, PersonId};
use crate::model::validation::{validate_age, ValidationError};
use log::{debug, info, warn};
use rusqlite::{params, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    age,
    created_at
FROM persons";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for person persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying store failure.
    Db(DbError),
    /// Delete targeted an id with no row.
    NotFound(PersonId),
    /// The store's unique constraint on `email` rejected the write.
    EmailTaken(String),
    /// Update targeted an id with no row.
    StaleRecord(PersonId),
    /// Update was given a record without an id.
    Unpersisted,
    /// A persisted row violates entity invariants.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::EmailTaken(email) => write!(f, "email already stored: {email}"),
            Self::StaleRecord(id) => write!(f, "no stored person to update with id {id}"),
            Self::Unpersisted => write!(f, "cannot update a person that has no id"),
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for person persistence.
pub trait PersonRepository {
    /// Inserts a new person and returns it with `id` and `created_at` set.
    fn create(&self, person: &Person) -> RepoResult<Person>;
    /// Loads one person by id.
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Loads every stored person. Order is storage-defined.
    fn find_all(&self) -> RepoResult<Vec<Person>>;
    /// Overwrites name/email/age of a persisted person and returns stored state.
    fn update(&self, person: &Person) -> RepoResult<Person>;
    /// Removes one person by id.
    fn delete(&self, id: PersonId) -> RepoResult<()>;
    /// Loads one person by exact email.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Person>>;
    /// Returns whether any stored person holds `email`.
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
}

impl<R: PersonRepository + ?Sized> PersonRepository for &R {
    fn create(&self, person: &Person) -> RepoResult<Person> {
        (**self).create(person)
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        (**self).find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Person>> {
        (**self).find_all()
    }

    fn update(&self, person: &Person) -> RepoResult<Person> {
        (**self).update(person)
    }

    fn delete(&self, id: PersonId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        (**self).find_by_email(email)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        (**self).exists_by_email(email)
    }
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'db> {
    db: &'db Database,
}

impl<'db> SqlitePersonRepository<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create(&self, person: &Person) -> RepoResult<Person> {
        let created = self
            .db
            .unit_of_work(
                "person_create",
                TransactionBehavior::Immediate,
                |tx| -> RepoResult<Person> {
                    let mut stmt = tx.prepare(
                        "INSERT INTO persons (
                            name,
                            email,
                            age,
                            created_at
                        ) VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
                        RETURNING id, name, email, age, created_at;",
                    )?;
                    let mut rows = stmt
                        .query(params![person.name.as_str(), person.email.as_str(), person.age])
                        .map_err(|err| translate_write_error(err, &person.email))?;
                    if let Some(row) = rows
                        .next()
                        .map_err(|err| translate_write_error(err, &person.email))?
                    {
                        return parse_person_row(row);
                    }

                    Err(RepoError::InvalidData("insert returned no row".to_string()))
                },
            )?;

        info!(
            "event=person_create module=repo status=ok id={}",
            created.id.unwrap_or_default()
        );
        Ok(created)
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let found = self
            .db
            .unit_of_work("person_find_by_id", TransactionBehavior::Deferred, |tx| {
                query_one(
                    tx,
                    &format!("{PERSON_SELECT_SQL} WHERE id = ?1;"),
                    params![id],
                )
            })?;

        debug!(
            "event=person_find_by_id module=repo status=ok id={} found={}",
            id,
            found.is_some()
        );
        Ok(found)
    }

    fn find_all(&self) -> RepoResult<Vec<Person>> {
        let persons = self
            .db
            .unit_of_work("person_find_all", TransactionBehavior::Deferred, |tx| {
                let mut stmt = tx.prepare(&format!("{PERSON_SELECT_SQL} ORDER BY id ASC;"))?;
                let mut rows = stmt.query([])?;
                let mut persons = Vec::new();
                while let Some(row) = rows.next()? {
                    persons.push(parse_person_row(row)?);
                }
                Ok::<_, RepoError>(persons)
            })?;

        debug!(
            "event=person_find_all module=repo status=ok count={}",
            persons.len()
        );
        Ok(persons)
    }

    fn update(&self, person: &Person) -> RepoResult<Person> {
        let id = person.id.ok_or(RepoError::Unpersisted)?;

        let updated = self
            .db
            .unit_of_work(
                "person_update",
                TransactionBehavior::Immediate,
                |tx| -> RepoResult<Person> {
                    let mut stmt = tx.prepare(
                        "UPDATE persons
                         SET
                            name = ?1,
                            email = ?2,
                            age = ?3
                         WHERE id = ?4
                         RETURNING id, name, email, age, created_at;",
                    )?;
                    let mut rows = stmt
                        .query(params![
                            person.name.as_str(),
                            person.email.as_str(),
                            person.age,
                            id
                        ])
                        .map_err(|err| translate_write_error(err, &person.email))?;
                    if let Some(row) = rows
                        .next()
                        .map_err(|err| translate_write_error(err, &person.email))?
                    {
                        return parse_person_row(row);
                    }

                    Err(RepoError::StaleRecord(id))
                },
            )?;

        info!("event=person_update module=repo status=ok id={id}");
        Ok(updated)
    }

    fn delete(&self, id: PersonId) -> RepoResult<()> {
        let result = self
            .db
            .unit_of_work(
                "person_delete",
                TransactionBehavior::Immediate,
                |tx| -> RepoResult<()> {
                    let changed = tx.execute("DELETE FROM persons WHERE id = ?1;", [id])?;
                    if changed == 0 {
                        return Err(RepoError::NotFound(id));
                    }
                    Ok(())
                },
            );

        match &result {
            Ok(()) => info!("event=person_delete module=repo status=ok id={id}"),
            Err(RepoError::NotFound(_)) => {
                warn!("event=person_delete module=repo status=not_found id={id}")
            }
            Err(_) => {}
        }
        result
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        self.db
            .unit_of_work("person_find_by_email", TransactionBehavior::Deferred, |tx| {
                query_one(
                    tx,
                    &format!("{PERSON_SELECT_SQL} WHERE email = ?1;"),
                    params![email],
                )
            })
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        self.db
            .unit_of_work("person_exists_by_email", TransactionBehavior::Deferred, |tx| {
                let exists: i64 = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM persons WHERE email = ?1);",
                    [email],
                    |row| row.get(0),
                )?;
                Ok(exists == 1)
            })
    }
}

fn query_one(
    tx: &Transaction<'_>,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> RepoResult<Option<Person>> {
    let mut stmt = tx.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_person_row(row)?));
    }

    Ok(None)
}

fn translate_write_error(err: rusqlite::Error, email: &str) -> RepoError {
    let err = DbError::from(err);
    if err.is_unique_violation() {
        warn!("event=person_write module=repo status=conflict error_code=email_unique_violation");
        return RepoError::EmailTaken(email.to_string());
    }
    RepoError::Db(err)
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id: PersonId = row.get("id")?;
    let name: String = row.get("name")?;
    let email: String = row.get("email")?;
    let age: Option<i32> = row.get("age")?;

    if name.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty name in persons.name for id {id}"
        )));
    }
    if email.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty email in persons.email for id {id}"
        )));
    }
    if let Err(ValidationError::AgeOutOfRange(value)) = validate_age(age) {
        return Err(RepoError::InvalidData(format!(
            "age `{value}` out of range in persons.age for id {id}"
        )));
    }

    Ok(Person {
        id: Some(id),
        name,
        email,
        age,
        created_at: Some(row.get("created_at")?),
    })
}
