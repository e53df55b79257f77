//! Process-wide store handle and unit-of-work runner.
//!
//! # Responsibility
//! - Own the single SQLite connection for the lifetime of the process.
//! - Wrap each repository operation in acquire, act, commit-or-rollback,
//!   release.
//!
//! # Invariants
//! - No transaction outlives the closure passed to `unit_of_work`.
//! - The connection lock is released on every exit path, including panics.

use super::migrations::current_user_version;
use super::open::{open_db, open_db_in_memory};
use super::{DbError, DbResult};
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Injected store handle consumed by SQLite repositories.
///
/// Created once at process start and closed once at shutdown. Repositories
/// borrow it and never keep the connection across operations.
pub struct Database {
    conn: Mutex<Connection>,
    mode: &'static str,
}

impl Database {
    /// Opens (or creates) a file-backed store with migrations applied.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_db(path)?),
            mode: "file",
        })
    }

    /// Opens a private in-memory store with migrations applied.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_db_in_memory()?),
            mode: "memory",
        })
    }

    /// Returns `file` or `memory`.
    pub fn mode(&self) -> &'static str {
        self.mode
    }

    /// Returns the applied schema version.
    pub fn schema_version(&self) -> DbResult<u32> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        current_user_version(&conn)
    }

    /// Runs `work` as one atomic unit of work.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
    /// A panic inside `work` drops the open transaction, which rolls it back;
    /// the poisoned lock is then recovered by later callers because nothing
    /// was committed.
    ///
    /// # Errors
    /// - Propagates the error returned by `work` after rollback.
    /// - Returns `DbError::Sqlite` when begin or commit fails.
    pub fn unit_of_work<T, E, F>(
        &self,
        label: &'static str,
        behavior: TransactionBehavior,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let started_at = Instant::now();
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        let tx = conn.transaction_with_behavior(behavior).map_err(|err| {
            error!(
                "event=unit_of_work module=db status=error op={} error_code=tx_begin_failed error={}",
                label, err
            );
            E::from(DbError::from(err))
        })?;

        match work(&tx) {
            Ok(value) => {
                tx.commit().map_err(|err| {
                    error!(
                        "event=unit_of_work module=db status=error op={} error_code=tx_commit_failed error={}",
                        label, err
                    );
                    E::from(DbError::from(err))
                })?;
                debug!(
                    "event=unit_of_work module=db status=ok op={} duration_ms={}",
                    label,
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(
                        "event=unit_of_work module=db status=error op={} error_code=tx_rollback_failed error={}",
                        label, rollback_err
                    );
                }
                warn!(
                    "event=unit_of_work module=db status=rolled_back op={} duration_ms={}",
                    label,
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Closes the underlying connection.
    ///
    /// # Errors
    /// - Returns `DbError::Sqlite` when SQLite refuses to close.
    pub fn close(self) -> DbResult<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, err)| DbError::from(err))?;
        info!("event=db_close module=db status=ok mode={}", self.mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::db::{migrations::latest_version, DbError, TransactionBehavior};

    fn count_rows(db: &Database) -> i64 {
        db.unit_of_work("count", TransactionBehavior::Deferred, |tx| {
            tx.query_row("SELECT COUNT(*) FROM persons;", [], |row| row.get(0))
                .map_err(DbError::from)
        })
        .unwrap()
    }

    #[test]
    fn in_memory_database_is_migrated() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.mode(), "memory");
        assert_eq!(db.schema_version().unwrap(), latest_version());
    }

    #[test]
    fn successful_work_is_committed() {
        let db = Database::open_in_memory().unwrap();
        db.unit_of_work("insert", TransactionBehavior::Immediate, |tx| {
            tx.execute(
                "INSERT INTO persons (name, email, created_at) VALUES ('A', 'a@b.com', 1);",
                [],
            )
            .map_err(DbError::from)
        })
        .unwrap();

        assert_eq!(count_rows(&db), 1);
    }

    #[test]
    fn failed_work_is_rolled_back() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<(), DbError> =
            db.unit_of_work("insert", TransactionBehavior::Immediate, |tx| {
                tx.execute(
                    "INSERT INTO persons (name, email, created_at) VALUES ('A', 'a@b.com', 1);",
                    [],
                )?;
                tx.execute(
                    "INSERT INTO persons (name, email, created_at) VALUES ('B', 'a@b.com', 2);",
                    [],
                )?;
                Ok(())
            });

        let err = result.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(count_rows(&db), 0);
    }

    #[test]
    fn panicking_work_rolls_back_and_releases_connection() {
        let db = Database::open_in_memory().unwrap();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<(), DbError> =
                db.unit_of_work("panic", TransactionBehavior::Immediate, |tx| {
                    tx.execute(
                        "INSERT INTO persons (name, email, created_at) VALUES ('A', 'a@b.com', 1);",
                        [],
                    )?;
                    panic!("boom");
                });
        }));

        assert!(outcome.is_err());
        assert_eq!(count_rows(&db), 0);
    }

    #[test]
    fn close_releases_handle() {
        let db = Database::open_in_memory().unwrap();
        db.close().unwrap();
    }
}
