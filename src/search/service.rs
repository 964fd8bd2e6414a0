//! Full-text search over posts, bookmarks and stream events.

use super::fts::safe_query;
use crate::{Error, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::instrument;

/// Results per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// An FTS5 table that can be searched, with the column identifying each hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTarget {
    /// Blog posts, keyed by slug. Drafts are excluded.
    Posts,
    /// Bookmarks, keyed by id. Unpublished bookmarks are excluded.
    Bookmarks,
    /// Activity stream events, keyed by id.
    Events,
}

impl SearchTarget {
    /// All targets.
    pub const ALL: [Self; 3] = [Self::Posts, Self::Bookmarks, Self::Events];

    /// Name used on the command line and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Bookmarks => "bookmarks",
            Self::Events => "events",
        }
    }

    const fn table(self) -> &'static str {
        match self {
            Self::Posts => "post_fts",
            Self::Bookmarks => "bookmark_fts",
            Self::Events => "event_fts",
        }
    }

    const fn key_column(self) -> &'static str {
        match self {
            Self::Posts => "slug",
            Self::Bookmarks | Self::Events => "id",
        }
    }

    const fn published_only(self) -> bool {
        matches!(self, Self::Posts | Self::Bookmarks)
    }

    fn where_clause(self) -> String {
        let table = self.table();
        if self.published_only() {
            format!("published > 0 AND {table} MATCH ?1")
        } else {
            format!("{table} MATCH ?1")
        }
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "posts" | "post" => Ok(Self::Posts),
            "bookmarks" | "bookmark" => Ok(Self::Bookmarks),
            "events" | "event" | "stream" => Ok(Self::Events),
            other => Err(Error::InvalidInput(format!(
                "unknown search target '{other}' (expected posts, bookmarks or events)"
            ))),
        }
    }
}

/// A 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// Creates a page. Numbers below 1 are treated as the first page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `size` is 0.
    pub fn new(number: u32, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidInput("page size must be greater than 0".to_string()));
        }
        Ok(Self {
            number: number.max(1),
            size,
        })
    }

    /// The page number, starting at 1.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Maximum results on the page.
    #[must_use]
    pub const fn size(self) -> u32 {
        self.size
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        (u64::from(self.number) - 1) * u64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    /// The sanitized query that was run.
    pub query: String,
    /// Total matches across all pages.
    pub total: u64,
    /// Keys of the hits on this page, best match first.
    pub keys: Vec<String>,
    /// The page that was fetched.
    pub page: Page,
}

/// Runs sanitized `MATCH` queries against the FTS tables.
pub struct SearchService<'a> {
    conn: &'a Connection,
}

impl<'a> SearchService<'a> {
    /// Creates a search service over a migrated database.
    #[must_use]
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Counts matches for `raw_query`.
    ///
    /// Input that sanitizes to nothing matches nothing; the database is not
    /// queried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the query fails.
    pub fn count(&self, target: SearchTarget, raw_query: &str) -> Result<u64> {
        let query = safe_query(raw_query);
        if query.is_empty() {
            return Ok(0);
        }
        self.count_sanitized(target, &query)
    }

    /// Fetches one page of hits for `raw_query`, ranked by relevance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if a query fails.
    #[instrument(skip_all, fields(target = %target, page = page.number()))]
    pub fn search(&self, target: SearchTarget, raw_query: &str, page: Page) -> Result<SearchPage> {
        let start = Instant::now();
        let query = safe_query(raw_query);

        let mut result = SearchPage {
            query,
            total: 0,
            keys: Vec::new(),
            page,
        };
        if result.query.is_empty() {
            return Ok(result);
        }

        result.total = self.count_sanitized(target, &result.query)?;
        if result.total > 0 {
            result.keys = self.fetch_keys(target, &result.query, page)?;
        }

        metrics::counter!("monet_search_queries_total", "target" => target.as_str())
            .increment(1);
        tracing::debug!(
            query = %result.query,
            total = result.total,
            hits = result.keys.len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Search completed"
        );

        Ok(result)
    }

    fn count_sanitized(&self, target: SearchTarget, query: &str) -> Result<u64> {
        let sql = format!(
            "SELECT count(*) FROM {} WHERE {}",
            target.table(),
            target.where_clause()
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params![query], |row| row.get(0))
            .map_err(|e| Error::OperationFailed {
                operation: format!("count_{target}"),
                cause: e.to_string(),
            })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn fetch_keys(&self, target: SearchTarget, query: &str, page: Page) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT CAST({} AS TEXT) FROM {} WHERE {} ORDER BY rank LIMIT ?2 OFFSET ?3",
            target.key_column(),
            target.table(),
            target.where_clause()
        );
        let map_err = |e: rusqlite::Error| Error::OperationFailed {
            operation: format!("search_{target}"),
            cause: e.to_string(),
        };

        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql).map_err(map_err)?;
        let rows = stmt
            .query_map(params![query, page.size(), offset], |row| row.get(0))
            .map_err(map_err)?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(map_err)
    }
}
