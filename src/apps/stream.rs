//! Activity stream events.

use crate::storage::MigrationSet;

/// Schema of the `event` table and its `event_fts` index.
#[must_use]
pub fn migrations() -> MigrationSet {
    MigrationSet::new("event")
        .with(
            "CREATE TABLE IF NOT EXISTS event (
                id integer PRIMARY KEY,
                title text,
                source_id text,
                timestamp datetime,
                type text,
                url text,
                data text,
                summary_rendered text
            );",
            "DROP TABLE event;",
        )
        .with(
            r#"CREATE VIRTUAL TABLE event_fts USING fts5(
                id, title, type, url, timestamp, data,
                content='event',
                content_rowid='id',
                tokenize="trigram"
            );"#,
            "DROP TABLE event_fts;",
        )
        .with(
            "INSERT INTO event_fts (event_fts) VALUES ('rebuild');",
            "INSERT INTO event_fts (event_fts) VALUES ('delete-all');",
        )
        .with(
            "CREATE TRIGGER event_i AFTER INSERT ON event BEGIN
                INSERT INTO event_fts (rowid, id, title, type, url, timestamp, data) VALUES
                    (new.id, new.id, new.title, new.type, new.url, new.timestamp, new.data);
            END;",
            "DROP TRIGGER event_i;",
        )
        .with(
            "CREATE TRIGGER event_d AFTER DELETE ON event BEGIN
                INSERT INTO event_fts (event_fts, rowid, id, title, type, url, timestamp, data)
                    VALUES ('delete', old.id, old.id, old.title, old.type, old.url, old.timestamp, old.data);
            END;",
            "DROP TRIGGER event_d;",
        )
        .with(
            "CREATE TRIGGER event_u AFTER UPDATE ON event BEGIN
                INSERT INTO event_fts (event_fts, rowid, id, title, type, url, timestamp, data)
                    VALUES ('delete', old.id, old.id, old.title, old.type, old.url, old.timestamp, old.data);
                INSERT INTO event_fts (rowid, id, title, type, url, timestamp, data) VALUES
                    (new.id, new.id, new.title, new.type, new.url, new.timestamp, new.data);
            END;",
            "DROP TRIGGER event_u;",
        )
}
