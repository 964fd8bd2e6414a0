//! Search command handler.

use monet::apps;
use monet::config::MonetConfig;
use monet::storage::{MigrationManager, open_database};
use monet::{Page, SearchService, SearchTarget};

/// Search command: runs a sanitized full-text query and lists matching keys.
///
/// The schema is migrated first so the FTS tables exist.
pub fn cmd_search(
    config: &MonetConfig,
    target: SearchTarget,
    query: &str,
    page: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_database(&config.database_path)?;
    MigrationManager::new(&conn)?.upgrade_all(&apps::all_sets())?;

    let page = Page::new(page, config.search.page_size)?;
    let results = SearchService::new(&conn).search(target, query, page)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.query.is_empty() {
        println!("Nothing to search for.");
        return Ok(());
    }

    println!("Query: {}", results.query);
    println!(
        "{} match(es) in {target}, page {}",
        results.total,
        page.number()
    );
    for key in &results.keys {
        println!("  {key}");
    }
    Ok(())
}
