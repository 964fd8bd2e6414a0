//! Stream-decoding loaders for archived posts, events and pages.

use crate::storage::SqlExecutor;
use crate::{Error, Result};
use chrono::DateTime;
use rusqlite::types::Value;
use rusqlite::{Connection, params};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Same layout as `SQLite`'s `datetime()`.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INSERT_POST: &str = "INSERT INTO post
    (title, slug, content, content_rendered, created_at, updated_at, published_at, published)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const INSERT_POST_TAG: &str = "INSERT INTO post_tag (post_id, tag) VALUES (?1, ?2)";

const INSERT_EVENT: &str = "INSERT INTO event
    (title, source_id, timestamp, type, url, data, summary_rendered)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const INSERT_PAGE: &str = "INSERT INTO page (url, content, content_rendered) VALUES (?1, ?2, ?3)";

/// The kind of content in an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Blog posts, inserted into `post` with their tags in `post_tag`.
    Posts,
    /// Activity stream events, inserted into `event`.
    Events,
    /// Flat pages, inserted into `page`.
    Pages,
}

impl ContentKind {
    /// Name used on the command line and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Events => "events",
            Self::Pages => "pages",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "posts" | "post" => Ok(Self::Posts),
            "events" | "event" | "stream" => Ok(Self::Events),
            "pages" | "page" => Ok(Self::Pages),
            other => Err(Error::InvalidInput(format!(
                "unknown content kind '{other}' (expected posts, events or pages)"
            ))),
        }
    }
}

/// An archived post. `timestamp` becomes both `created_at` and `updated_at`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostRecord {
    #[serde(alias = "Title")]
    title: String,
    #[serde(alias = "Slug")]
    slug: String,
    #[serde(alias = "Content")]
    content: String,
    #[serde(alias = "ContentRendered", alias = "contentrendered")]
    content_rendered: String,
    #[serde(alias = "Tags")]
    tags: Vec<String>,
    #[serde(alias = "Timestamp")]
    timestamp: i64,
    #[serde(alias = "Published")]
    published: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventRecord {
    #[serde(alias = "Title")]
    title: String,
    #[serde(alias = "SourceId", alias = "sourceid")]
    source_id: String,
    #[serde(alias = "Url")]
    url: String,
    #[serde(rename = "type", alias = "Type")]
    kind: String,
    #[serde(alias = "Data")]
    data: String,
    #[serde(alias = "SummaryRendered", alias = "summaryrendered")]
    summary_rendered: String,
    #[serde(alias = "Timestamp")]
    timestamp: i64,
}

/// Archived pages carry no title or timestamps; the table defaults apply.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageRecord {
    #[serde(alias = "URL", alias = "Url")]
    url: String,
    #[serde(alias = "Content")]
    content: String,
    #[serde(alias = "ContentRendered", alias = "contentrendered")]
    content_rendered: String,
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// What was loaded.
    pub kind: ContentKind,
    /// Number of records inserted.
    pub loaded: usize,
}

/// Inserts archived content into a migrated database.
///
/// A whole file is loaded in one transaction: a record that fails to decode
/// or insert rolls back every record before it.
pub struct ContentLoader<'a> {
    conn: &'a Connection,
}

impl<'a> ContentLoader<'a> {
    /// Creates a loader over a migrated database.
    #[must_use]
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Loads the archive file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the file cannot be opened, and
    /// any error of [`Self::load`].
    pub fn load_path(&self, kind: ContentKind, path: impl AsRef<Path>) -> Result<LoadSummary> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::OperationFailed {
            operation: "open_content_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        self.load(kind, BufReader::new(file))
    }

    /// Decodes JSON objects from `reader` until it is exhausted, inserting
    /// each as a `kind` record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if a record cannot be decoded or
    /// inserted, or the transaction fails, and [`Error::InvalidInput`] if a
    /// timestamp is out of range. Nothing is inserted in either case.
    #[instrument(skip(self, reader))]
    pub fn load<R: Read>(&self, kind: ContentKind, reader: R) -> Result<LoadSummary> {
        let loaded = self.conn.in_transaction(|conn| match kind {
            ContentKind::Posts => insert_each(reader, kind, |post: PostRecord| {
                insert_post(conn, &post)
            }),
            ContentKind::Events => insert_each(reader, kind, |event: EventRecord| {
                insert_event(conn, &event)
            }),
            ContentKind::Pages => insert_each(reader, kind, |page: PageRecord| {
                insert_page(conn, &page)
            }),
        })?;

        tracing::info!(kind = %kind, loaded, "Loaded content");
        metrics::counter!("monet_content_loaded_total", "kind" => kind.as_str())
            .increment(u64::try_from(loaded).unwrap_or(u64::MAX));

        Ok(LoadSummary { kind, loaded })
    }
}

fn insert_each<R, T, F>(reader: R, kind: ContentKind, mut insert: F) -> Result<usize>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let mut loaded = 0;
    for record in serde_json::Deserializer::from_reader(reader).into_iter::<T>() {
        let record = record.map_err(|e| Error::OperationFailed {
            operation: format!("decode_{kind}"),
            cause: format!("record {}: {e}", loaded + 1),
        })?;
        insert(record)?;
        loaded += 1;
    }
    Ok(loaded)
}

fn insert_post(conn: &Connection, post: &PostRecord) -> Result<()> {
    let created_at = format_timestamp(post.timestamp)?;
    // Unpublished posts keep the column default.
    let published_at = if post.published > 0 {
        Value::Text(created_at.clone())
    } else {
        Value::Integer(0)
    };

    conn.execute(
        INSERT_POST,
        params![
            post.title,
            post.slug,
            post.content,
            post.content_rendered,
            created_at,
            created_at,
            published_at,
            post.published
        ],
    )
    .map_err(|e| insert_failed("insert_post", &post.slug, &e))?;

    let id = conn.last_insert_rowid();
    for tag in &post.tags {
        conn.execute(INSERT_POST_TAG, params![id, tag])
            .map_err(|e| insert_failed("insert_post_tag", &post.slug, &e))?;
    }
    Ok(())
}

fn insert_event(conn: &Connection, event: &EventRecord) -> Result<()> {
    let timestamp = format_timestamp(event.timestamp)?;
    conn.execute(
        INSERT_EVENT,
        params![
            event.title,
            event.source_id,
            timestamp,
            event.kind,
            event.url,
            event.data,
            event.summary_rendered
        ],
    )
    .map(|_| ())
    .map_err(|e| insert_failed("insert_event", &event.title, &e))
}

fn insert_page(conn: &Connection, page: &PageRecord) -> Result<()> {
    conn.execute(
        INSERT_PAGE,
        params![page.url, page.content, page.content_rendered],
    )
    .map(|_| ())
    .map_err(|e| insert_failed("insert_page", &page.url, &e))
}

fn insert_failed(operation: &str, key: &str, e: &rusqlite::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("'{key}': {e}"),
    }
}

fn format_timestamp(secs: i64) -> Result<String> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .ok_or_else(|| Error::InvalidInput(format!("timestamp {secs} is out of range")))
}
