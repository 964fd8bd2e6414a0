//! Integration tests for loading archived content into a migrated database.

#![allow(clippy::unwrap_used)]

use monet::apps;
use monet::io::{ContentKind, ContentLoader};
use monet::storage::{MigrationManager, open_database};
use monet::{Error, Page, SearchService, SearchTarget};
use rusqlite::Connection;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn migrated(dir: &TempDir) -> Connection {
    let conn = open_database(dir.path().join("monet.db")).unwrap();
    MigrationManager::new(&conn)
        .unwrap()
        .upgrade_all(&apps::all_sets())
        .unwrap();
    conn
}

fn archive(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn keys(conn: &Connection, target: SearchTarget, query: &str) -> Vec<String> {
    let mut keys = SearchService::new(conn)
        .search(target, query, Page::default())
        .unwrap()
        .keys;
    keys.sort();
    keys
}

#[test]
fn test_loaded_posts_are_searchable() {
    let dir = TempDir::new().unwrap();
    let conn = migrated(&dir);
    let file = archive(
        r#"{"title": "Rewriting in Rust", "slug": "rewriting", "content": "ownership everywhere",
            "tags": ["rust"], "timestamp": 1700000000, "published": 1}
           {"title": "Rust drafts", "slug": "rust-drafts", "content": "not yet",
            "timestamp": 1700000100, "published": 0}
           {"title": "Go notes", "slug": "go-notes", "content": "channels and rust",
            "timestamp": 1700000200, "published": 2}"#,
    );

    let summary = ContentLoader::new(&conn)
        .load_path(ContentKind::Posts, file.path())
        .unwrap();
    assert_eq!(summary.loaded, 3);

    assert_eq!(keys(&conn, SearchTarget::Posts, "rust"), vec!["go-notes", "rewriting"]);
    assert_eq!(keys(&conn, SearchTarget::Posts, "ownership"), vec!["rewriting"]);
    assert!(keys(&conn, SearchTarget::Posts, "yet").is_empty());
}

#[test]
fn test_loaded_events_are_searchable() {
    let dir = TempDir::new().unwrap();
    let conn = migrated(&dir);
    let file = archive(
        r#"{"title": "Pushed to monet", "type": "github", "url": "https://github.com/x",
            "data": "{}", "timestamp": 1700000000}
           {"title": "Posted a photo", "type": "bluesky", "url": "https://bsky.app/x",
            "data": "{}", "timestamp": 1700000001}"#,
    );

    ContentLoader::new(&conn)
        .load_path(ContentKind::Events, file.path())
        .unwrap();

    let hits = keys(&conn, SearchTarget::Events, "bluesky");
    assert_eq!(hits.len(), 1);
    assert_eq!(SearchService::new(&conn).count(SearchTarget::Events, "posted").unwrap(), 1);
}

#[test]
fn test_failed_load_leaves_index_untouched() {
    let dir = TempDir::new().unwrap();
    let conn = migrated(&dir);
    let file = archive(
        r#"{"title": "Searchable title", "slug": "first", "published": 1}
           {"title": ["not", "a", "string"]}"#,
    );

    let err = ContentLoader::new(&conn)
        .load_path(ContentKind::Posts, file.path())
        .unwrap_err();
    assert!(matches!(err, Error::OperationFailed { ref operation, .. } if operation == "decode_posts"));
    assert!(keys(&conn, SearchTarget::Posts, "searchable").is_empty());
}
