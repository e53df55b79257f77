use personbook_core::db::migrations::latest_version;
use personbook_core::db::{open_db, open_db_in_memory, DbError};
use personbook_core::Database;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "persons");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("personbook.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.mode(), "file");
    assert_eq!(db.schema_version().unwrap(), latest_version());
    db.close().unwrap();
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn email_column_is_unique_at_the_store_level() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO persons (name, email, created_at) VALUES ('A', 'a@b.com', 1);",
        [],
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO persons (name, email, created_at) VALUES ('B', 'a@b.com', 2);",
            [],
        )
        .unwrap_err();
    assert!(DbError::from(err).is_unique_violation());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
