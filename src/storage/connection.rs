//! Opening and configuring `SQLite` connections.

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default database file name inside the data directory.
pub const DATABASE_FILE: &str = "monet.db";

/// Returns the per-user data directory for monet.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if no home directory can be determined.
pub fn get_user_data_dir() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .map(|b| b.data_local_dir().join("monet"))
        .ok_or_else(|| Error::OperationFailed {
            operation: "get_user_data_dir".to_string(),
            cause: "Could not determine user data directory".to_string(),
        })
}

/// Opens (creating if needed) the database at `path`.
///
/// Missing parent directories are created, then the connection is tuned
/// with [`configure_connection`].
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the directory cannot be created,
/// the file cannot be opened or a pragma is rejected.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_database_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }

    let conn = Connection::open(path).map_err(|e| Error::OperationFailed {
        operation: "open_sqlite".to_string(),
        cause: e.to_string(),
    })?;

    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|e| Error::OperationFailed {
            operation: "configure_connection".to_string(),
            cause: format!("journal_mode: {e}"),
        })?;
    configure_connection(&conn)?;

    tracing::debug!(path = %path.display(), "Opened database");
    Ok(conn)
}

/// Opens a private in-memory database with the same settings.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the database cannot be opened.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
        operation: "open_sqlite_memory".to_string(),
        cause: e.to_string(),
    })?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Applies the connection settings shared by file and memory databases.
///
/// - **NORMAL synchronous**: durable enough under WAL, much cheaper than FULL
/// - **`busy_timeout`**: waits up to 5 seconds for a competing writer
/// - **`foreign_keys`**: enforces the `post_tag` to `post` reference
///
/// WAL is only requested by [`open_database`]; in-memory databases cannot
/// use it.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a pragma is rejected.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // busy_timeout reports its new value as a row, so it goes through the API.
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| Error::OperationFailed {
            operation: "configure_connection".to_string(),
            cause: format!("busy_timeout: {e}"),
        })?;

    for (pragma, value) in [("synchronous", "NORMAL"), ("foreign_keys", "ON")] {
        conn.pragma_update(None, pragma, value)
            .map_err(|e| Error::OperationFailed {
                operation: "configure_connection".to_string(),
                cause: format!("{pragma}: {e}"),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tempfile::TempDir;

    fn pragma_i64(conn: &Connection, name: &str) -> i64 {
        conn.pragma_query_value(None, name, |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_open_in_memory_pragmas() {
        let conn = open_in_memory().unwrap();
        assert_eq!(pragma_i64(&conn, "synchronous"), 1);
        assert_eq!(pragma_i64(&conn, "busy_timeout"), 5000);
        assert_eq!(pragma_i64(&conn, "foreign_keys"), 1);
    }

    #[test]
    fn test_open_database_creates_parents_and_uses_wal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join(DATABASE_FILE);

        let conn = open_database(&path).unwrap();
        assert!(path.exists());

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
        assert_eq!(pragma_i64(&conn, "foreign_keys"), 1);
    }

    #[test]
    fn test_open_database_rejects_directory_path() {
        let dir = TempDir::new().unwrap();
        let result = open_database(dir.path());
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }
}
