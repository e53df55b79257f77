#![allow(dead_code)]

use personbook_core::{Person, PersonId, PersonRepository, RepoError, RepoResult};
use std::cell::{Cell, RefCell};

/// In-memory repository that records every call it receives.
#[derive(Default)]
pub struct RecordingRepository {
    rows: RefCell<Vec<Person>>,
    last_id: Cell<PersonId>,
    calls: RefCell<Vec<&'static str>>,
}

impl RecordingRepository {
    pub fn calls_to(&self, op: &str) -> usize {
        self.calls.borrow().iter().filter(|call| **call == op).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn stored(&self) -> Vec<Person> {
        self.rows.borrow().clone()
    }

    fn record(&self, op: &'static str) {
        self.calls.borrow_mut().push(op);
    }
}

impl PersonRepository for RecordingRepository {
    fn create(&self, person: &Person) -> RepoResult<Person> {
        self.record("create");
        if self.rows.borrow().iter().any(|row| row.email == person.email) {
            return Err(RepoError::EmailTaken(person.email.clone()));
        }

        let id = self.last_id.get() + 1;
        self.last_id.set(id);
        let mut stored = person.clone();
        stored.id = Some(id);
        stored.created_at = Some(1_700_000_000_000 + id);
        self.rows.borrow_mut().push(stored.clone());
        Ok(stored)
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.record("find_by_id");
        Ok(self
            .rows
            .borrow()
            .iter()
            .find(|row| row.id == Some(id))
            .cloned())
    }

    fn find_all(&self) -> RepoResult<Vec<Person>> {
        self.record("find_all");
        Ok(self.stored())
    }

    fn update(&self, person: &Person) -> RepoResult<Person> {
        self.record("update");
        let id = person.id.ok_or(RepoError::Unpersisted)?;
        let mut rows = self.rows.borrow_mut();
        if rows
            .iter()
            .any(|row| row.id != Some(id) && row.email == person.email)
        {
            return Err(RepoError::EmailTaken(person.email.clone()));
        }

        let row = rows
            .iter_mut()
            .find(|row| row.id == Some(id))
            .ok_or(RepoError::StaleRecord(id))?;
        row.name = person.name.clone();
        row.email = person.email.clone();
        row.age = person.age;
        Ok(row.clone())
    }

    fn delete(&self, id: PersonId) -> RepoResult<()> {
        self.record("delete");
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|row| row.id != Some(id));
        if rows.len() == before {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        self.record("find_by_email");
        Ok(self
            .rows
            .borrow()
            .iter()
            .find(|row| row.email == email)
            .cloned())
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        self.record("exists_by_email");
        Ok(self.rows.borrow().iter().any(|row| row.email == email))
    }
}
