//! Editor autosave snapshots for posts and pages.

use crate::storage::MigrationSet;

/// Schema of the `autosaves` table.
///
/// Version 2 rebuilds the table to store `created_at` as a datetime instead
/// of unix seconds; its down converts back.
#[must_use]
pub fn migrations() -> MigrationSet {
    MigrationSet::new("autosave")
        .with(
            "CREATE TABLE IF NOT EXISTS autosaves (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                content_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                title TEXT,
                created_at INTEGER NOT NULL
            );",
            "DROP TABLE autosaves;",
        )
        .with(
            "CREATE INDEX idx_autosaves_lookup ON autosaves(content_type, content_id, created_at DESC);",
            "DROP INDEX idx_autosaves_lookup;",
        )
        .with(
            "CREATE TABLE autosaves_new (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                content_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                title TEXT,
                created_at datetime NOT NULL
            );
            INSERT INTO autosaves_new
                SELECT id, content_type, content_id, content, title, datetime(created_at, 'unixepoch')
                FROM autosaves;
            DROP TABLE autosaves;
            ALTER TABLE autosaves_new RENAME TO autosaves;
            CREATE INDEX idx_autosaves_lookup ON autosaves(content_type, content_id, created_at DESC);",
            "CREATE TABLE autosaves_new (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_type TEXT NOT NULL,
                content_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                title TEXT,
                created_at INTEGER NOT NULL
            );
            INSERT INTO autosaves_new
                SELECT id, content_type, content_id, content, title, strftime('%s', created_at)
                FROM autosaves;
            DROP TABLE autosaves;
            ALTER TABLE autosaves_new RENAME TO autosaves;
            CREATE INDEX idx_autosaves_lookup ON autosaves(content_type, content_id, created_at DESC);",
        )
}
