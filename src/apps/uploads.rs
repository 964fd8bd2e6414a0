//! Uploaded file records.

use crate::storage::MigrationSet;

/// Schema of the `upload` table.
#[must_use]
pub fn migrations() -> MigrationSet {
    MigrationSet::new("uploads")
        .with(
            "CREATE TABLE IF NOT EXISTS upload (
                id INTEGER PRIMARY KEY,
                filesystem_name TEXT NOT NULL,
                filename TEXT NOT NULL,
                size INTEGER DEFAULT 0,
                created_at datetime DEFAULT (datetime('now'))
            );",
            "DROP TABLE upload;",
        )
        .with(
            "CREATE INDEX IF NOT EXISTS idx_upload_filesystem ON upload(filesystem_name);",
            "DROP INDEX idx_upload_filesystem;",
        )
        .with(
            "CREATE INDEX IF NOT EXISTS idx_upload_created_at ON upload(created_at);",
            "DROP INDEX idx_upload_created_at;",
        )
}
