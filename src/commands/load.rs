//! Load command handler.

use monet::apps;
use monet::config::MonetConfig;
use monet::io::{ContentKind, ContentLoader};
use monet::storage::{MigrationManager, open_database};
use std::path::Path;

/// Load command: inserts archived posts, events or pages from `file`.
///
/// The schema is migrated first so the target tables and their FTS
/// triggers exist.
pub fn cmd_load(
    config: &MonetConfig,
    kind: ContentKind,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_database(&config.database_path)?;
    MigrationManager::new(&conn)?.upgrade_all(&apps::all_sets())?;

    let summary = ContentLoader::new(&conn).load_path(kind, file)?;
    println!("Loaded {} {} from {}", summary.loaded, summary.kind, file.display());
    Ok(())
}
