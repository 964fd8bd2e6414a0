//! Flat pages served at fixed URLs.

use crate::storage::MigrationSet;

/// Schema of the `page` table.
#[must_use]
pub fn migrations() -> MigrationSet {
    MigrationSet::new("page").with(
        "CREATE TABLE IF NOT EXISTS page (
            id integer PRIMARY KEY,
            url text,
            content text,
            content_rendered text,
            created_at datetime DEFAULT (strftime('%s', 'now')),
            updated_at datetime DEFAULT (strftime('%s', 'now'))
        );",
        "DROP TABLE page;",
    )
}
