//! Schema catalog of the platform's apps.
//!
//! Each app owns one or more append-only [`MigrationSet`]s. [`all_sets`]
//! lists them in the order start-up applies them; `post_tag` references
//! `post`, so that order matters.

pub mod auth;
pub mod autosave;
pub mod blog;
pub mod bookmarks;
pub mod pages;
pub mod stream;
pub mod uploads;

use crate::storage::MigrationSet;

/// Every app's migration set, in start-up order.
#[must_use]
pub fn all_sets() -> Vec<MigrationSet> {
    vec![
        auth::migrations(),
        blog::post_migrations(),
        blog::post_tag_migrations(),
        bookmarks::migrations(),
        stream::migrations(),
        pages::migrations(),
        uploads::migrations(),
        autosave::migrations(),
    ]
}

/// Looks up an app's migration set by its recorded name.
#[must_use]
pub fn find_set(name: &str) -> Option<MigrationSet> {
    all_sets().into_iter().find(|set| set.name() == name)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::storage::{BOOTSTRAP_SET, MigrationManager, open_in_memory};
    use std::collections::HashSet;

    #[test]
    fn test_set_names_are_unique() {
        let names: Vec<String> = all_sets().iter().map(|s| s.name().to_string()).collect();
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(!names.iter().any(|n| n == BOOTSTRAP_SET));
    }

    #[test]
    fn test_find_set() {
        assert_eq!(find_set("post").unwrap().len(), 8);
        assert_eq!(find_set("autosave").unwrap().latest_version(), 2);
        assert!(find_set("gallery").is_none());
    }

    #[test]
    fn test_catalog_applies_cleanly() {
        let conn = open_in_memory().unwrap();
        let manager = MigrationManager::new(&conn).unwrap();
        let sets = all_sets();

        let expected: usize = sets.iter().map(MigrationSet::len).sum();
        assert_eq!(manager.upgrade_all(&sets).unwrap(), expected);
        assert_eq!(manager.upgrade_all(&sets).unwrap(), 0);

        for set in &sets {
            assert_eq!(manager.get_version(set.name()).unwrap(), set.latest_version());
        }
    }

    #[test]
    fn test_every_set_downgrades_to_version_zero() {
        let conn = open_in_memory().unwrap();
        let manager = MigrationManager::new(&conn).unwrap();
        let sets = all_sets();
        manager.upgrade_all(&sets).unwrap();

        // Reverse order so post_tag goes before post.
        for set in sets.iter().rev() {
            while manager.get_version(set.name()).unwrap() > 0 {
                manager.downgrade(set.name()).unwrap();
            }
        }

        // Upgrading again replays every step above version 0.
        let replayed: usize = sets.iter().map(|s| s.len() - 1).sum();
        assert_eq!(manager.upgrade_all(&sets).unwrap(), replayed);
    }
}
