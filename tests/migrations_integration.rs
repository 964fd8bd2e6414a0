//! Integration tests for the migration engine and the app schema catalog.

// Integration tests use unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::unwrap_used, clippy::expect_used)]

use monet::apps;
use monet::storage::{
    BOOTSTRAP_SET, MigrationManager, MigrationSet, SqlExecutor, open_database, with_transaction,
};
use monet::{Error, Result};
use rusqlite::{Connection, Row, ToSql};
use std::cell::Cell;
use tempfile::TempDir;

/// Delegates to a connection and counts every statement issued through it.
struct CountingExecutor {
    conn: Connection,
    calls: Cell<usize>,
}

impl CountingExecutor {
    fn new(conn: Connection) -> Self {
        Self {
            conn,
            calls: Cell::new(0),
        }
    }

    fn bump(&self) {
        self.calls.set(self.calls.get() + 1);
    }

    fn take_calls(&self) -> usize {
        self.calls.replace(0)
    }
}

impl SqlExecutor for CountingExecutor {
    fn exec(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<usize> {
        self.bump();
        self.conn.exec(sql, params)
    }

    fn exec_batch(&self, sql: &str) -> rusqlite::Result<()> {
        self.bump();
        self.conn.exec_batch(sql)
    }

    fn get<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.bump();
        self.conn.get(sql, params, f)
    }

    fn select<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.bump();
        self.conn.select(sql, params, f)
    }

    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        with_transaction(&self.conn, self, f)
    }
}

/// Delegates to a connection but fails statements starting with a given prefix.
#[derive(Debug)]
struct FailingExecutor {
    conn: Connection,
    fail_batch: Option<&'static str>,
    fail_exec: Option<&'static str>,
}

impl FailingExecutor {
    fn new() -> Self {
        Self {
            conn: Connection::open_in_memory().unwrap(),
            fail_batch: None,
            fail_exec: None,
        }
    }

    fn injected(prefix: Option<&str>, sql: &str) -> rusqlite::Result<()> {
        match prefix {
            Some(prefix) if sql.trim_start().starts_with(prefix) => {
                Err(rusqlite::Error::InvalidQuery)
            },
            _ => Ok(()),
        }
    }
}

impl SqlExecutor for FailingExecutor {
    fn exec(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<usize> {
        Self::injected(self.fail_exec, sql)?;
        self.conn.exec(sql, params)
    }

    fn exec_batch(&self, sql: &str) -> rusqlite::Result<()> {
        Self::injected(self.fail_batch, sql)?;
        self.conn.exec_batch(sql)
    }

    fn get<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.conn.get(sql, params, f)
    }

    fn select<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.conn.select(sql, params, f)
    }

    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        with_transaction(&self.conn, self, f)
    }
}

fn table_count(conn: &Connection, name: &str) -> i64 {
    conn.get(
        "SELECT count(*) FROM sqlite_master WHERE name = ?1",
        rusqlite::params![name],
        |r| r.get(0),
    )
    .unwrap()
    .unwrap()
}

fn counting_in_memory() -> CountingExecutor {
    CountingExecutor::new(Connection::open_in_memory().unwrap())
}

#[test]
fn test_bootstrap_call_counts() {
    let db = counting_in_memory();

    MigrationManager::new(&db).unwrap();
    // create + version read + 2 x (up + record)
    assert_eq!(db.take_calls(), 6);

    MigrationManager::new(&db).unwrap();
    // create + version read
    assert_eq!(db.take_calls(), 2);
}

#[test]
fn test_repeat_upgrade_only_reads_version() {
    let db = counting_in_memory();
    let manager = MigrationManager::new(&db).unwrap();
    let set = apps::pages::migrations();

    assert_eq!(manager.upgrade(&set).unwrap(), 1);
    db.take_calls();

    assert_eq!(manager.upgrade(&set).unwrap(), 0);
    assert_eq!(db.take_calls(), 1);
}

#[test]
fn test_appended_suffix_only() {
    let db = counting_in_memory();
    let manager = MigrationManager::new(&db).unwrap();

    let base = MigrationSet::new("notes").with("CREATE TABLE notes (id integer)", "DROP TABLE notes");
    manager.upgrade(&base).unwrap();
    db.take_calls();

    let grown = base
        .clone()
        .with("ALTER TABLE notes ADD COLUMN body text", "ALTER TABLE notes DROP COLUMN body")
        .with("CREATE INDEX idx_notes ON notes (id)", "DROP INDEX idx_notes");
    assert_eq!(manager.upgrade(&grown).unwrap(), 2);
    // version read + 2 x (up + record)
    assert_eq!(db.take_calls(), 5);
    assert_eq!(manager.get_version("notes").unwrap(), 2);
}

#[test]
fn test_version_after_full_upgrade_is_len_minus_one() {
    let db = counting_in_memory();
    let manager = MigrationManager::new(&db).unwrap();

    for set in apps::all_sets() {
        manager.upgrade(&set).unwrap();
        let expected = i64::try_from(set.len()).unwrap() - 1;
        assert_eq!(manager.get_version(set.name()).unwrap(), expected);
    }
}

#[test]
fn test_failed_downgrade_removes_nothing() {
    let db = counting_in_memory();
    let manager = MigrationManager::new(&db).unwrap();
    manager.upgrade(&apps::auth::migrations()).unwrap();

    let before = manager.latest_versions().unwrap();
    assert!(matches!(
        manager.downgrade("user"),
        Err(Error::DowngradeBoundary { .. })
    ));
    assert!(matches!(
        manager.downgrade("never-applied"),
        Err(Error::DowngradeBoundary { .. })
    ));
    assert_eq!(manager.latest_versions().unwrap(), before);
}

#[test]
fn test_downgrade_uses_recorded_statement() {
    let db = counting_in_memory();
    let manager = MigrationManager::new(&db).unwrap();

    let set = MigrationSet::new("kv")
        .with("CREATE TABLE kv (k text)", "DROP TABLE kv")
        .with("CREATE TABLE kv_audit (k text)", "DROP TABLE kv_audit");
    manager.upgrade(&set).unwrap();

    // Code that ships a different down later must not affect the recorded one.
    let changed = MigrationSet::new("kv")
        .with("CREATE TABLE kv (k text)", "DROP TABLE kv")
        .with("CREATE TABLE kv_audit (k text)", "DROP TABLE does_not_exist");
    assert_eq!(manager.upgrade(&changed).unwrap(), 0);

    assert_eq!(manager.downgrade("kv").unwrap(), 1);
    assert_eq!(manager.get_version("kv").unwrap(), 0);
    let remaining: Option<i64> = db
        .conn
        .get(
            "SELECT count(*) FROM sqlite_master WHERE name = 'kv_audit'",
            &[],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(remaining, Some(0));
}

#[test]
fn test_catalog_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("site").join("monet.db");
    let sets = apps::all_sets();

    {
        let conn = open_database(&path).unwrap();
        let manager = MigrationManager::new(&conn).unwrap();
        assert!(manager.upgrade_all(&sets).unwrap() > 0);
    }

    let conn = open_database(&path).unwrap();
    let manager = MigrationManager::new(&conn).unwrap();
    assert_eq!(manager.upgrade_all(&sets).unwrap(), 0);

    let versions = manager.latest_versions().unwrap();
    assert_eq!(versions.len(), sets.len() + 1);
    assert!(versions.iter().any(|v| v.name == BOOTSTRAP_SET && v.version == 1));

    let names: Vec<&str> = versions.iter().map(|v| v.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn test_upgrade_all_stops_at_first_failure() {
    let db = counting_in_memory();
    let manager = MigrationManager::new(&db).unwrap();

    let sets = vec![
        MigrationSet::new("first").with("CREATE TABLE first (id integer)", "DROP TABLE first"),
        MigrationSet::new("broken").with("CREATE TABLE first (id integer)", "SELECT 1"),
        MigrationSet::new("never").with("CREATE TABLE never (id integer)", "DROP TABLE never"),
    ];

    let err = manager.upgrade_all(&sets).unwrap_err();
    assert!(matches!(err, Error::MigrationFailed { ref set, version: 0, .. } if set == "broken"));
    assert!(err.to_string().contains("CREATE TABLE first"));
    assert_eq!(manager.get_version("first").unwrap(), 0);
    assert_eq!(manager.get_version("broken").unwrap(), -1);
    assert_eq!(manager.get_version("never").unwrap(), -1);
}

#[test]
fn test_bootstrap_fails_when_table_cannot_be_created() {
    let mut db = FailingExecutor::new();
    db.fail_batch = Some("CREATE TABLE IF NOT EXISTS migrations");

    let err = MigrationManager::new(&db).unwrap_err();
    assert!(matches!(
        err,
        Error::OperationFailed { ref operation, .. } if operation == "bootstrap_migrations_table"
    ));
    assert_eq!(table_count(&db.conn, "migrations"), 0);
}

#[test]
fn test_bootstrap_fails_when_self_upgrade_fails() {
    let mut db = FailingExecutor::new();
    db.fail_exec = Some("INSERT INTO migrations");

    let err = MigrationManager::new(&db).unwrap_err();
    assert!(matches!(
        err,
        Error::RecordFailed { ref set, version: 0, .. } if set == BOOTSTRAP_SET
    ));
}

#[test]
fn test_failed_record_rolls_back_schema_change() {
    let mut db = FailingExecutor::new();
    let manager = MigrationManager::new(&db).unwrap();
    assert_eq!(manager.get_version(BOOTSTRAP_SET).unwrap(), 1);
    drop(manager);

    db.fail_exec = Some("INSERT INTO migrations");
    let manager = MigrationManager::new(&db).unwrap();
    let set = MigrationSet::new("t").with("CREATE TABLE t (id integer)", "DROP TABLE t");

    let err = manager.upgrade(&set).unwrap_err();
    assert!(matches!(err, Error::RecordFailed { ref set, version: 0, .. } if set == "t"));
    assert_eq!(table_count(&db.conn, "t"), 0);
    assert_eq!(manager.get_version("t").unwrap(), -1);
}
