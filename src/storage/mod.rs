//! Embedded `SQLite` storage.
//!
//! - [`connection`]: opening the database with the pragmas every caller expects
//! - [`migrations`]: versioned schema migrations and the `migrations` table

pub mod connection;
pub mod migrations;

pub use connection::{
    BUSY_TIMEOUT, DATABASE_FILE, configure_connection, get_user_data_dir, open_database, open_in_memory,
};
pub use migrations::{
    BOOTSTRAP_SET, Migration, MigrationManager, MigrationRecord, MigrationSet, MigrationVersion,
    SqlExecutor, with_transaction,
};
