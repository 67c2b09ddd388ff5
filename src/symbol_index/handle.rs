//! Shared, reloadable access to the current symbol table

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use super::index::SymbolIndex;
use super::loader::load_dir;
use crate::error::Result;

/// Cheap-to-clone handle to the published table.
///
/// Readers take a snapshot and query it without holding any lock. A reload
/// builds the replacement first and then swaps the pointer, so a snapshot is
/// always a complete table.
#[derive(Clone, Default)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<SymbolIndex>>>,
}

impl IndexHandle {
    pub fn new(index: SymbolIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Load `dir` and wrap the result in a handle.
    pub fn open(dir: &Path, pattern: &str) -> Result<Self> {
        Ok(Self::new(load_dir(dir, pattern)?))
    }

    /// The table currently published
    pub fn snapshot(&self) -> Arc<SymbolIndex> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Publish a fully built table, returning the one it replaced.
    pub fn replace(&self, index: SymbolIndex) -> Arc<SymbolIndex> {
        self.publish(Arc::new(index))
    }

    fn publish(&self, next: Arc<SymbolIndex>) -> Arc<SymbolIndex> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }

    /// Rebuild from `dir` and return the table this call published. On
    /// failure the previous table stays published.
    pub fn reload_from_dir(&self, dir: &Path, pattern: &str) -> Result<Arc<SymbolIndex>> {
        match load_dir(dir, pattern) {
            Ok(index) => {
                info!(dir = %dir.display(), entries = index.len(), "published reloaded symbol index");
                let next = Arc::new(index);
                self.publish(next.clone());
                Ok(next)
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "reload failed, keeping previous symbol index");
                Err(e)
            }
        }
    }

    /// Drop the current table in favour of an empty one.
    pub fn discard(&self) {
        self.replace(SymbolIndex::empty());
        info!("symbol index discarded");
    }
}
