//! Versioned schema migrations.
//!
//! Every app describes its schema as a [`MigrationSet`]: an append-only list
//! of up/down statement pairs whose positions are their versions. The
//! [`MigrationManager`] records applied versions in a `migrations` table,
//! `(version, name, down, applied_at)`, that it creates on construction and
//! versions with its own set, [`BOOTSTRAP_SET`].
//!
//! The manager reaches the database only through [`SqlExecutor`], so tests
//! can wrap a connection to observe or count the statements it issues.

mod executor;
mod manager;
mod set;

pub use executor::{SqlExecutor, with_transaction};
pub use manager::{
    BOOTSTRAP_SET, MigrationManager, MigrationRecord, MigrationVersion, bootstrap_set,
};
pub use set::{Migration, MigrationSet};
