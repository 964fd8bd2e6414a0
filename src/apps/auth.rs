//! User accounts.

use crate::storage::MigrationSet;

/// Schema of the `users` table. Usernames are unique.
#[must_use]
pub fn migrations() -> MigrationSet {
    MigrationSet::new("user").with(
        "CREATE TABLE IF NOT EXISTS users (
            id int NOT NULL,
            username text NOT NULL,
            password_hash text NOT NULL,
            PRIMARY KEY (username)
        );",
        "DROP TABLE users;",
    )
}
