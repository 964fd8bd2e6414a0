//! Bulk content import.
//!
//! Archived posts, stream events and pages are read as a stream of JSON
//! objects (one after another, whitespace separated, as written by most
//! export tools) and inserted into the app tables. The FTS triggers index
//! loaded posts and events as they are inserted, so they are searchable as
//! soon as the load commits.
//!
//! ```rust,no_run
//! use monet::io::{ContentKind, ContentLoader};
//! use monet::storage::{MigrationManager, open_database};
//!
//! let conn = open_database("monet.db")?;
//! MigrationManager::new(&conn)?.upgrade_all(&monet::apps::all_sets())?;
//!
//! let summary = ContentLoader::new(&conn).load_path(ContentKind::Posts, "posts.json")?;
//! println!("loaded {} posts", summary.loaded);
//! # Ok::<(), monet::Error>(())
//! ```

pub mod load;

pub use load::{ContentKind, ContentLoader, LoadSummary};
