use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while loading or reloading a symbol index.
///
/// Lookups never fail: an absent key is `None` and an empty result list
/// means nothing matched.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("malformed shard {shard}: {reason}")]
    MalformedData { shard: String, reason: String },

    #[error("shard {shard} redefines key `{key}` with a different target list")]
    DuplicateKey { shard: String, key: String },

    #[error("no shard matching `{pattern}` in {}", dir.display())]
    NoShards { dir: PathBuf, pattern: String },

    #[error("invalid shard pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Watch(#[from] notify::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl IndexError {
    pub(crate) fn malformed(shard: &str, reason: impl Into<String>) -> Self {
        IndexError::MalformedData {
            shard: shard.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the structural load failures (bad shape or conflicting keys).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            IndexError::MalformedData { .. } | IndexError::DuplicateKey { .. }
        )
    }
}
