//! The narrow SQL capability the migration engine depends on.

use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, ToSql};

/// Anything that can execute parameterized SQL and scan results.
///
/// [`MigrationManager`](super::MigrationManager) only ever talks to the
/// database through this trait. It is implemented for
/// [`rusqlite::Connection`]; wrappers (for instance one that counts calls)
/// can implement it by delegating and reuse [`with_transaction`].
pub trait SqlExecutor {
    /// Executes a single parameterized statement, returning the changed row count.
    fn exec(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<usize>;

    /// Executes a script of one or more `;`-separated statements.
    fn exec_batch(&self, sql: &str) -> rusqlite::Result<()>;

    /// Runs a query and maps its first row, or returns `None` if it has none.
    fn get<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>;

    /// Runs a query and maps every row.
    fn select<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>;

    /// Runs `f` inside a transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; on error (or panic)
    /// it is rolled back.
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}

impl SqlExecutor for Connection {
    fn exec(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<usize> {
        self.execute(sql, params)
    }

    fn exec_batch(&self, sql: &str) -> rusqlite::Result<()> {
        self.execute_batch(sql)
    }

    fn get<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.query_row(sql, params, f).optional()
    }

    fn select<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare(sql)?;
        let rows = stmt.query_map(params, f)?;
        rows.collect()
    }

    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        with_transaction(self, self, f)
    }
}

/// Runs `f(scope)` inside a transaction opened on `conn`.
///
/// `scope` is normally the executor that owns `conn`, so statements issued
/// by `f` land inside the transaction. Dropping the uncommitted transaction
/// on the error path rolls it back.
pub fn with_transaction<S, T, F>(conn: &Connection, scope: &S, f: F) -> Result<T>
where
    S: ?Sized,
    F: FnOnce(&S) -> Result<T>,
{
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::OperationFailed {
            operation: "begin_transaction".to_string(),
            cause: e.to_string(),
        })?;

    let value = f(scope)?;

    tx.commit().map_err(|e| Error::OperationFailed {
        operation: "commit_transaction".to_string(),
        cause: e.to_string(),
    })?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rusqlite::params;

    fn conn_with_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.exec_batch("CREATE TABLE t (id integer PRIMARY KEY, v text)")
            .unwrap();
        conn
    }

    #[test]
    fn test_get_returns_none_for_no_rows() {
        let conn = conn_with_table();
        let row: Option<String> = conn
            .get("SELECT v FROM t WHERE id = ?1", params![1], |r| r.get(0))
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn test_exec_and_select() {
        let conn = conn_with_table();
        conn.exec("INSERT INTO t (id, v) VALUES (?1, ?2)", params![1, "a"])
            .unwrap();
        conn.exec("INSERT INTO t (id, v) VALUES (?1, ?2)", params![2, "b"])
            .unwrap();

        let values: Vec<String> = conn
            .select("SELECT v FROM t ORDER BY id", &[], |r| r.get(0))
            .unwrap();
        assert_eq!(values, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let conn = conn_with_table();
        conn.in_transaction(|db| {
            db.exec("INSERT INTO t (id, v) VALUES (1, 'x')", &[])
                .map_err(|e| Error::OperationFailed {
                    operation: "insert".to_string(),
                    cause: e.to_string(),
                })?;
            Ok(())
        })
        .unwrap();

        let count: Option<i64> = conn.get("SELECT count(*) FROM t", &[], |r| r.get(0)).unwrap();
        assert_eq!(count, Some(1));
    }

    #[test]
    fn test_transaction_rolls_back_on_err() {
        let conn = conn_with_table();
        let result: Result<()> = conn.in_transaction(|db| {
            db.exec("INSERT INTO t (id, v) VALUES (1, 'x')", &[]).unwrap();
            Err(Error::InvalidInput("abort".to_string()))
        });
        assert!(result.is_err());

        let count: Option<i64> = conn.get("SELECT count(*) FROM t", &[], |r| r.get(0)).unwrap();
        assert_eq!(count, Some(0));
    }
}
