//! Bookmarks and their full-text index.

use crate::storage::MigrationSet;

/// Schema of the `bookmark` table and its `bookmark_fts` index.
///
/// Bookmark ids are text, so the index follows the table's implicit rowid.
#[must_use]
pub fn migrations() -> MigrationSet {
    MigrationSet::new("bookmark")
        .with(
            "CREATE TABLE IF NOT EXISTS bookmark (
                id text PRIMARY KEY,
                url text NOT NULL,
                title text,
                description text,
                description_rendered text,
                screenshot_path text,
                published integer DEFAULT 0,
                created_at datetime DEFAULT (strftime('%s', 'now')),
                updated_at datetime DEFAULT (strftime('%s', 'now')),
                published_at datetime DEFAULT 0
            );",
            "DROP TABLE bookmark;",
        )
        .with(
            "CREATE INDEX IF NOT EXISTS idx_bookmark_published ON bookmark(published);",
            "DROP INDEX idx_bookmark_published;",
        )
        .with(
            "CREATE INDEX IF NOT EXISTS idx_bookmark_created_at ON bookmark(created_at);",
            "DROP INDEX idx_bookmark_created_at;",
        )
        .with(
            r#"CREATE VIRTUAL TABLE bookmark_fts USING fts5(
                id UNINDEXED, title, url, description, published,
                content='bookmark',
                tokenize="trigram"
            );"#,
            "DROP TABLE bookmark_fts;",
        )
        .with(
            "INSERT INTO bookmark_fts (bookmark_fts) VALUES ('rebuild');",
            "INSERT INTO bookmark_fts (bookmark_fts) VALUES ('delete-all');",
        )
        .with(
            "CREATE TRIGGER bookmark_i AFTER INSERT ON bookmark BEGIN
                INSERT INTO bookmark_fts (rowid, id, title, url, description, published) VALUES
                    (new.rowid, new.id, new.title, new.url, new.description, new.published);
            END;",
            "DROP TRIGGER bookmark_i;",
        )
        .with(
            "CREATE TRIGGER bookmark_d AFTER DELETE ON bookmark BEGIN
                INSERT INTO bookmark_fts (bookmark_fts, rowid, id, title, url, description, published)
                    VALUES ('delete', old.rowid, old.id, old.title, old.url, old.description, old.published);
            END;",
            "DROP TRIGGER bookmark_d;",
        )
        .with(
            "CREATE TRIGGER bookmark_u AFTER UPDATE ON bookmark BEGIN
                INSERT INTO bookmark_fts (bookmark_fts, rowid, id, title, url, description, published)
                    VALUES ('delete', old.rowid, old.id, old.title, old.url, old.description, old.published);
                INSERT INTO bookmark_fts (rowid, id, title, url, description, published) VALUES
                    (new.rowid, new.id, new.title, new.url, new.description, new.published);
            END;",
            "DROP TRIGGER bookmark_u;",
        )
        .with(
            "ALTER TABLE bookmark ADD COLUMN icon_path text DEFAULT '';",
            "ALTER TABLE bookmark DROP COLUMN icon_path;",
        )
}
