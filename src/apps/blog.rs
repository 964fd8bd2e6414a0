//! Blog posts, their full-text index and tags.

use crate::storage::MigrationSet;

/// Schema of the `post` table and its `post_fts` index.
///
/// `post_fts` is an external-content table over `post` keyed by `post.id`;
/// the triggers keep it in step with inserts, deletes and updates.
#[must_use]
pub fn post_migrations() -> MigrationSet {
    MigrationSet::new("post")
        .with(
            "CREATE TABLE IF NOT EXISTS post (
                id INTEGER PRIMARY KEY,
                title TEXT,
                slug TEXT,
                content TEXT DEFAULT '',
                content_rendered TEXT DEFAULT '',
                created_at datetime DEFAULT (datetime('now')),
                updated_at datetime DEFAULT (datetime('now')),
                published_at datetime DEFAULT 0,
                published INTEGER DEFAULT 0
            );",
            "DROP TABLE post;",
        )
        .with(
            r#"CREATE VIRTUAL TABLE post_fts USING fts5(
                id, title, slug, content, published,
                content='post',
                content_rowid='id',
                tokenize="trigram"
            );"#,
            "DROP TABLE post_fts;",
        )
        .with(
            "INSERT INTO post_fts (post_fts) VALUES ('rebuild');",
            "INSERT INTO post_fts (post_fts) VALUES ('delete-all');",
        )
        .with(
            "CREATE TRIGGER post_i AFTER INSERT ON post BEGIN
                INSERT INTO post_fts (rowid, id, title, slug, content, published) VALUES
                    (new.id, new.id, new.title, new.slug, new.content, new.published);
            END;",
            "DROP TRIGGER post_i;",
        )
        .with(
            "CREATE TRIGGER post_d AFTER DELETE ON post BEGIN
                INSERT INTO post_fts (post_fts, rowid, id, title, slug, content, published) VALUES
                    ('delete', old.id, old.id, old.title, old.slug, old.content, old.published);
            END;",
            "DROP TRIGGER post_d;",
        )
        .with(
            "CREATE TRIGGER post_u AFTER UPDATE ON post BEGIN
                INSERT INTO post_fts (post_fts, rowid, id, title, slug, content, published) VALUES
                    ('delete', old.id, old.id, old.title, old.slug, old.content, old.published);
                INSERT INTO post_fts (rowid, id, title, slug, content, published) VALUES
                    (new.id, new.id, new.title, new.slug, new.content, new.published);
            END;",
            "DROP TRIGGER post_u;",
        )
        .with(
            "ALTER TABLE post ADD COLUMN og_description text DEFAULT '';",
            "ALTER TABLE post DROP COLUMN og_description;",
        )
        .with(
            "ALTER TABLE post ADD COLUMN og_image text DEFAULT '';",
            "ALTER TABLE post DROP COLUMN og_image;",
        )
}

/// Schema of the `post_tag` join table. Must run after [`post_migrations`].
#[must_use]
pub fn post_tag_migrations() -> MigrationSet {
    MigrationSet::new("post_tag").with(
        "CREATE TABLE IF NOT EXISTS post_tag (
            post_id INTEGER,
            tag TEXT,
            FOREIGN KEY (post_id) REFERENCES post(id)
        );",
        "DROP TABLE post_tag;",
    )
}
