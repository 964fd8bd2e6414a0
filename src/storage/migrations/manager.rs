//! Applies and reverts migration sets, tracking versions in `migrations`.

use super::executor::SqlExecutor;
use super::set::MigrationSet;
use crate::{Error, Result, current_timestamp};
use chrono::{DateTime, Utc};
use rusqlite::params;
use rusqlite::types::{FromSqlError, Type};
use serde::Serialize;
use tracing::instrument;

/// Name of the set that creates and versions the `migrations` table itself.
pub const BOOTSTRAP_SET: &str = "monarch";

const CREATE_MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS migrations (
    version int NOT NULL,
    name text NOT NULL,
    down text NOT NULL,
    applied_at datetime NOT NULL,
    PRIMARY KEY (version, name)
);";

const GET_VERSION: &str = "SELECT COALESCE(max(version), -1) FROM migrations WHERE name = ?1";

const ADD_VERSION: &str =
    "INSERT INTO migrations (version, name, applied_at, down) VALUES (?1, ?2, ?3, ?4)";

const REMOVE_VERSION: &str = "DELETE FROM migrations WHERE name = ?1 AND version = ?2";

const LATEST_RECORD: &str = "SELECT version, name, down, applied_at FROM migrations
    WHERE name = ?1 ORDER BY version DESC LIMIT 1";

const LATEST_VERSIONS: &str = "WITH ranked AS (
    SELECT version, name, applied_at,
           rank() OVER (PARTITION BY name ORDER BY version DESC) AS rank
    FROM migrations
)
SELECT version, name, applied_at FROM ranked WHERE rank = 1 ORDER BY name";

/// The migration set that manages the `migrations` table.
///
/// Version 0 is the same statement the manager runs before anything else,
/// so recording it is all that happens on a fresh database.
#[must_use]
pub fn bootstrap_set() -> MigrationSet {
    MigrationSet::new(BOOTSTRAP_SET)
        .with(CREATE_MIGRATIONS_TABLE, "DROP TABLE migrations;")
        .with(
            "CREATE INDEX migration_name ON migrations (name, version);",
            "DROP INDEX migration_name;",
        )
}

/// One row of the `migrations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// Name of the set the version belongs to.
    pub name: String,
    /// Applied version.
    pub version: i64,
    /// Statement that reverts this version, captured when it was applied.
    pub down: String,
    /// When the version was applied (second precision).
    pub applied_at: DateTime<Utc>,
}

/// The highest applied version of one set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationVersion {
    /// Name of the set.
    pub name: String,
    /// Highest applied version.
    pub version: i64,
    /// When that version was applied.
    pub applied_at: DateTime<Utc>,
}

/// Upgrades and downgrades named migration sets against one database.
///
/// Construction bootstraps the `migrations` table, so every other operation
/// can assume it exists. Each migration step runs in its own transaction
/// together with its version record: a failing step leaves the schema at
/// the previous version.
///
/// # Examples
///
/// ```rust
/// use monet::{MigrationManager, MigrationSet};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory()?;
/// let manager = MigrationManager::new(&conn)?;
///
/// let pages = MigrationSet::new("page")
///     .with("CREATE TABLE page (id integer PRIMARY KEY)", "DROP TABLE page");
/// assert_eq!(manager.upgrade(&pages)?, 1);
/// assert_eq!(manager.get_version("page")?, 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct MigrationManager<'a, D: SqlExecutor> {
    db: &'a D,
}

impl<'a, D: SqlExecutor> MigrationManager<'a, D> {
    /// Creates a manager, creating and upgrading the `migrations` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created or the bootstrap set
    /// fails to upgrade.
    pub fn new(db: &'a D) -> Result<Self> {
        db.exec_batch(CREATE_MIGRATIONS_TABLE)
            .map_err(|e| Error::OperationFailed {
                operation: "bootstrap_migrations_table".to_string(),
                cause: e.to_string(),
            })?;

        let manager = Self { db };
        manager.upgrade(&bootstrap_set())?;
        Ok(manager)
    }

    /// Applies every migration of `set` above its recorded version.
    ///
    /// Returns the number of migrations applied; 0 when already current.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionQuery`] if the current version cannot be read,
    /// [`Error::MigrationFailed`] if an up statement fails and
    /// [`Error::RecordFailed`] if its version cannot be recorded. Steps
    /// applied before the failure stay applied.
    #[instrument(skip(self, set), fields(set = %set.name()))]
    pub fn upgrade(&self, set: &MigrationSet) -> Result<usize> {
        let current = self.get_version(set.name())?;
        let mut applied = 0;

        for (version, migration) in set.iter().filter(|(v, _)| *v > current) {
            self.db.in_transaction(|db| {
                db.exec_batch(migration.up())
                    .map_err(|e| Error::MigrationFailed {
                        set: set.name().to_string(),
                        version,
                        statement: migration.up().to_string(),
                        cause: e.to_string(),
                    })?;
                insert_record(db, set.name(), version, migration.down())
            })?;

            tracing::info!(set = set.name(), version, "Applied migration");
            metrics::counter!("monet_migrations_applied_total", "set" => set.name().to_string())
                .increment(1);
            applied += 1;
        }

        Ok(applied)
    }

    /// Upgrades each set in order, stopping at the first failure.
    ///
    /// Returns the total number of migrations applied.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Self::upgrade`].
    pub fn upgrade_all(&self, sets: &[MigrationSet]) -> Result<usize> {
        let mut total = 0;
        for set in sets {
            total += self.upgrade(set)?;
        }
        Ok(total)
    }

    /// Reverts the highest applied version of the set `name`.
    ///
    /// The `down` statement stored with that version is executed, not the
    /// one in the current code, and the record is removed in the same
    /// transaction. Returns the version that was reverted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DowngradeBoundary`] if the set has no records or is
    /// at version 0, [`Error::MigrationFailed`] if the down statement fails
    /// and [`Error::RecordFailed`] if the record cannot be removed.
    #[instrument(skip(self))]
    pub fn downgrade(&self, name: &str) -> Result<i64> {
        let record = self
            .latest_record(name)?
            .ok_or_else(|| Error::DowngradeBoundary {
                set: name.to_string(),
                reason: "no applied migrations".to_string(),
            })?;

        if record.version == 0 {
            return Err(Error::DowngradeBoundary {
                set: name.to_string(),
                reason: "cannot downgrade past version 0".to_string(),
            });
        }

        self.db.in_transaction(|db| {
            db.exec_batch(&record.down)
                .map_err(|e| Error::MigrationFailed {
                    set: name.to_string(),
                    version: record.version,
                    statement: record.down.clone(),
                    cause: e.to_string(),
                })?;
            delete_record(db, name, record.version)
        })?;

        tracing::info!(set = name, version = record.version, "Reverted migration");
        metrics::counter!("monet_migrations_reverted_total", "set" => name.to_string())
            .increment(1);

        Ok(record.version)
    }

    /// Returns the highest applied version of `name`, or -1 if none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionQuery`] if the query fails.
    pub fn get_version(&self, name: &str) -> Result<i64> {
        self.db
            .get(GET_VERSION, params![name], |row| row.get(0))
            .map(|version| version.unwrap_or(-1))
            .map_err(|e| Error::VersionQuery {
                set: name.to_string(),
                cause: e.to_string(),
            })
    }

    /// Returns the record of the highest applied version of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionQuery`] if the query fails.
    pub fn latest_record(&self, name: &str) -> Result<Option<MigrationRecord>> {
        self.db
            .get(LATEST_RECORD, params![name], |row| {
                Ok(MigrationRecord {
                    version: row.get(0)?,
                    name: row.get(1)?,
                    down: row.get(2)?,
                    applied_at: from_unix(3, row.get(3)?)?,
                })
            })
            .map_err(|e| Error::VersionQuery {
                set: name.to_string(),
                cause: e.to_string(),
            })
    }

    /// Lists the highest applied version of every set, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the query fails.
    pub fn latest_versions(&self) -> Result<Vec<MigrationVersion>> {
        self.db
            .select(LATEST_VERSIONS, params![], |row| {
                Ok(MigrationVersion {
                    version: row.get(0)?,
                    name: row.get(1)?,
                    applied_at: from_unix(2, row.get(2)?)?,
                })
            })
            .map_err(|e| Error::OperationFailed {
                operation: "latest_versions".to_string(),
                cause: e.to_string(),
            })
    }

    /// Records `version` of `name` as applied now, storing its `down` statement.
    ///
    /// Normally called by [`Self::upgrade`]; exposed for tooling that applies
    /// schema changes by other means.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordFailed`] if the insert fails, including when
    /// the version is already recorded.
    pub fn add_version(&self, name: &str, version: i64, down: &str) -> Result<()> {
        insert_record(self.db, name, version, down)
    }

    /// Deletes the record of `version` of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordFailed`] if the delete fails.
    pub fn remove_version(&self, name: &str, version: i64) -> Result<()> {
        delete_record(self.db, name, version)
    }
}

fn insert_record<D: SqlExecutor>(db: &D, name: &str, version: i64, down: &str) -> Result<()> {
    db.exec(ADD_VERSION, params![version, name, current_timestamp(), down])
        .map(|_| ())
        .map_err(|e| Error::RecordFailed {
            set: name.to_string(),
            version,
            cause: e.to_string(),
        })
}

fn delete_record<D: SqlExecutor>(db: &D, name: &str, version: i64) -> Result<()> {
    db.exec(REMOVE_VERSION, params![name, version])
        .map(|_| ())
        .map_err(|e| Error::RecordFailed {
            set: name.to_string(),
            version,
            cause: e.to_string(),
        })
}

/// Converts the `applied_at` column at `idx`, rejecting out-of-range values.
fn from_unix(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            Box::new(FromSqlError::OutOfRange(secs)),
        )
    })
}
