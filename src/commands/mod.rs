//! Command handlers module.
//!
//! - `load.rs`: archived content import
//! - `migrate.rs`: schema commands (migrate, status, downgrade)
//! - `search.rs`: full-text search from the command line

mod load;
mod migrate;
mod search;

pub use load::cmd_load;
pub use migrate::{cmd_downgrade, cmd_migrate, cmd_status};
pub use search::cmd_search;

/// Version command: crate version and the bundled `SQLite` version.
pub fn cmd_version() -> Result<(), Box<dyn std::error::Error>> {
    println!("monet {}", env!("CARGO_PKG_VERSION"));
    println!("sqlite {}", rusqlite::version());
    Ok(())
}
