//! Symbol Index for generated documentation
//!
//! Loads the search shards a documentation generator ships with its HTML
//! output and resolves typed symbol names to documentation anchors.
//!
//! A loaded `SymbolIndex` is immutable; concurrent readers need no locking.
//! `IndexHandle` publishes replacement tables atomically and `ShardWatcher`
//! drives reloads from the filesystem.

pub mod escape;
mod handle;
mod index;
pub mod js_literal;
pub mod loader;
mod manager;
mod search;
mod shard;
mod types;
mod watcher;

pub use handle::IndexHandle;
pub use index::{MatchMode, MatchRank, QueryResults, SymbolIndex};
pub use loader::{discover_shards, load_dir, DEFAULT_SHARD_PATTERN};
pub use manager::IndexManager;
pub use search::{execute_search, SearchQuery, SearchResult};
pub use shard::{parse_shard, ShardFormat};
pub use types::{IndexEntry, Target, TargetKind};
pub use watcher::ShardWatcher;
