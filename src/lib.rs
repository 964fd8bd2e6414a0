//! # Monet
//!
//! Storage core for a personal content platform: a blog, flat pages,
//! bookmarks, an activity stream, an upload tracker and user accounts, all
//! kept in one embedded `SQLite` database.
//!
//! Each app owns a named, append-only [`MigrationSet`]. At start-up every set
//! is brought to its latest version by a [`MigrationManager`], which tracks
//! applied versions in a `migrations` table that it creates and versions with
//! itself. Full-text search over posts, bookmarks and stream events goes
//! through [`safe_query`], which repairs arbitrary user input into a valid
//! FTS5 query.
//!
//! ## Example
//!
//! ```rust,no_run
//! use monet::storage::{MigrationManager, open_in_memory};
//!
//! let conn = open_in_memory()?;
//! let manager = MigrationManager::new(&conn)?;
//! manager.upgrade_all(&monet::apps::all_sets())?;
//!
//! assert_eq!(monet::safe_query("x and y and not"), r#""x" AND "y" AND "NOT""#);
//! # Ok::<(), monet::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod apps;
pub mod config;
pub mod io;
pub mod observability;
pub mod search;
pub mod storage;

pub use config::MonetConfig;
pub use search::{Page, SearchPage, SearchService, SearchTarget, safe_query};
pub use storage::{
    Migration, MigrationManager, MigrationRecord, MigrationSet, MigrationVersion, SqlExecutor,
};

/// Error type for monet operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Bad configuration values, unknown app, search target or content kind names, out-of-range archive timestamps |
/// | `OperationFailed` | Opening the database, pragmas, config I/O, logging init, search queries, content loading |
/// | `MigrationFailed` | An up or down statement fails against the database |
/// | `VersionQuery` | The current version or latest record of a set cannot be read |
/// | `DowngradeBoundary` | Downgrading a set with no records or at version 0 |
/// | `RecordFailed` | Writing or deleting a row in the `migrations` table fails |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A migration statement failed.
    ///
    /// The step's transaction has been rolled back, so neither the schema
    /// change nor its version record is visible.
    #[error("migration '{set}' version {version} failed: {cause} <{statement}>")]
    MigrationFailed {
        /// Name of the migration set.
        set: String,
        /// Version (position in the set) of the failing migration.
        version: i64,
        /// The statement that failed.
        statement: String,
        /// The underlying cause.
        cause: String,
    },

    /// The applied version of a set could not be read.
    #[error("reading version of migration set '{set}' failed: {cause}")]
    VersionQuery {
        /// Name of the migration set.
        set: String,
        /// The underlying cause.
        cause: String,
    },

    /// A downgrade would go below the lowest recorded version.
    #[error("cannot downgrade '{set}': {reason}")]
    DowngradeBoundary {
        /// Name of the migration set.
        set: String,
        /// Why the downgrade was refused.
        reason: String,
    },

    /// A version record could not be written or removed.
    #[error("recording migration '{set}' version {version} failed: {cause}")]
    RecordFailed {
        /// Name of the migration set.
        set: String,
        /// Version being recorded or removed.
        version: i64,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for monet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or(0)
}
