//! Schema command handlers.

use monet::apps;
use monet::config::MonetConfig;
use monet::storage::{MigrationManager, open_database};

/// Migrate command: brings every app's schema to its latest version.
///
/// # Errors
///
/// Returns the first migration error; later sets are not attempted.
pub fn cmd_migrate(config: &MonetConfig) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_database(&config.database_path)?;
    let manager = MigrationManager::new(&conn)?;
    let applied = manager.upgrade_all(&apps::all_sets())?;

    if applied == 0 {
        println!("Database is up to date: {}", config.database_path.display());
    } else {
        println!(
            "Applied {applied} migration(s) to {}",
            config.database_path.display()
        );
    }
    Ok(())
}

/// Status command: prints the latest applied version of every set.
pub fn cmd_status(config: &MonetConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_database(&config.database_path)?;
    let manager = MigrationManager::new(&conn)?;
    let versions = manager.latest_versions()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    for version in &versions {
        println!(
            "app={} version={} applied-at={}",
            version.name,
            version.version,
            version.applied_at.to_rfc3339()
        );
    }
    Ok(())
}

/// Downgrade command: reverts the latest version of one set.
pub fn cmd_downgrade(config: &MonetConfig, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_database(&config.database_path)?;
    let manager = MigrationManager::new(&conn)?;

    let reverted = manager.downgrade(name)?;
    println!(
        "Downgraded {name} from version {reverted} to {}",
        manager.get_version(name)?
    );
    Ok(())
}
