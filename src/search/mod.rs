//! Full-text search.
//!
//! [`safe_query`] turns raw user input into a valid FTS5 query;
//! [`SearchService`] runs it against the trigram-tokenized FTS tables the
//! blog, bookmark and stream apps maintain.

mod fts;
mod service;

pub use fts::safe_query;
pub use service::{DEFAULT_PAGE_SIZE, Page, SearchPage, SearchService, SearchTarget};
