use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::handle::IndexHandle;
use super::index::SymbolIndex;
use super::search::{execute_search, SearchQuery, SearchResult};
use super::types::Target;
use super::watcher::ShardWatcher;
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};

/// Owns the published index for one documentation build, plus the optional
/// watcher keeping it fresh.
#[derive(Clone)]
pub struct IndexManager {
    handle: IndexHandle,
    shard_dir: PathBuf,
    config: IndexConfig,
    _watcher: Arc<Option<ShardWatcher>>,
}

impl IndexManager {
    /// Load the shard directory named by `config` and start watching it if
    /// asked to.
    pub fn new(config: IndexConfig) -> Result<Self> {
        Self::start(config.resolved_shard_dir(), config)
    }

    fn start(shard_dir: Option<PathBuf>, config: IndexConfig) -> Result<Self> {
        let shard_dir = shard_dir
            .ok_or_else(|| IndexError::Config("no shard directory configured".to_string()))?;
        Self::open(&shard_dir, config)
    }

    pub fn open(shard_dir: &Path, config: IndexConfig) -> Result<Self> {
        let handle = IndexHandle::open(shard_dir, &config.shard_pattern)?;
        info!(
            dir = %shard_dir.display(),
            entries = handle.snapshot().len(),
            "symbol index ready"
        );

        let watcher = if config.watch {
            match ShardWatcher::new(
                handle.clone(),
                shard_dir,
                &config.shard_pattern,
                config.debounce(),
            ) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!(error = %e, "failed to start shard watcher");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            handle,
            shard_dir: shard_dir.to_path_buf(),
            config,
            _watcher: Arc::new(watcher),
        })
    }

    pub fn handle(&self) -> &IndexHandle {
        &self.handle
    }

    pub fn snapshot(&self) -> Arc<SymbolIndex> {
        self.handle.snapshot()
    }

    /// Search with the configured match mode, capped at `limit` or the
    /// configured default.
    pub fn search(&self, text: &str, limit: Option<usize>) -> Vec<SearchResult> {
        let query = SearchQuery::text(text)
            .with_mode(self.config.match_mode)
            .with_limit(limit.unwrap_or(self.config.default_limit));
        execute_search(&self.handle.snapshot(), &query)
    }

    pub fn get(&self, key: &str) -> Option<Vec<Target>> {
        self.handle.snapshot().get(key).map(<[Target]>::to_vec)
    }

    pub fn reload(&self) -> Result<Arc<SymbolIndex>> {
        self.handle
            .reload_from_dir(&self.shard_dir, &self.config.shard_pattern)
    }

    pub fn discard(&self) {
        self.handle.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_index::MatchMode;
    use std::fs;
    use tempfile::TempDir;

    const SHARD: &str = "var searchData=[\
        ['rank',['rank',['../a.html#x',1,'libsemigroups::Blocks']]],\
        ['prank',['prank',['../b.html#y',1,'libsemigroups']]]\
    ];";

    #[test]
    fn test_manager_uses_configured_mode() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("all_0.js"), SHARD).unwrap();

        let substring = IndexManager::open(temp_dir.path(), IndexConfig::default()).unwrap();
        assert_eq!(substring.search("rank", None).len(), 2);

        let prefix = IndexManager::open(
            temp_dir.path(),
            IndexConfig {
                match_mode: MatchMode::Prefix,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(prefix.search("rank", None).len(), 1);
        assert_eq!(prefix.search("", Some(1)).len(), 1);
    }

    #[test]
    fn test_manager_reload_and_discard() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("all_0.js"), SHARD).unwrap();

        let manager = IndexManager::open(temp_dir.path(), IndexConfig::default()).unwrap();
        assert!(manager.get("rank").is_some());

        manager.discard();
        assert!(manager.get("rank").is_none());

        manager.reload().unwrap();
        assert_eq!(manager.get("rank").unwrap().len(), 1);
    }

    #[test]
    fn test_manager_without_shard_dir() {
        assert!(matches!(
            IndexManager::start(None, IndexConfig::default()),
            Err(IndexError::Config(_))
        ));
    }

    #[test]
    fn test_manager_with_configured_shard_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("all_0.js"), SHARD).unwrap();

        let manager =
            IndexManager::start(Some(temp_dir.path().to_path_buf()), IndexConfig::default()).unwrap();
        assert_eq!(manager.snapshot().len(), 2);
    }
}
