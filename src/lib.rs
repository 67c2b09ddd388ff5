//! docsym: symbol search over generated documentation indexes
//!
//! ```no_run
//! use docsym::symbol_index::{IndexHandle, SearchQuery, execute_search, DEFAULT_SHARD_PATTERN};
//!
//! let handle = IndexHandle::open("html/search".as_ref(), DEFAULT_SHARD_PATTERN)?;
//! let index = handle.snapshot();
//! for result in execute_search(&index, &SearchQuery::text("rewr")) {
//!     for target in &result.entry.targets {
//!         println!("{} -> {}", target.display_label(), target.url);
//!     }
//! }
//! # Ok::<(), docsym::IndexError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod symbol_index;

pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use symbol_index::{IndexHandle, IndexManager, SymbolIndex};
