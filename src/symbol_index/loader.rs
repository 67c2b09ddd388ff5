//! Loading shards from a documentation build directory

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::index::SymbolIndex;
use crate::error::{IndexError, Result};

/// Default shard file pattern for Doxygen output (`search/all_*.js`)
pub const DEFAULT_SHARD_PATTERN: &str = "all_*.js";

/// Shard files directly inside `dir` whose name matches `pattern`,
/// sorted by file name.
pub fn discover_shards(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern)?;

    let mut shards = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .file_name()
            .to_str()
            .map(|name| pattern.matches(name))
            .unwrap_or(false);
        if matches {
            shards.push(entry.into_path());
        }
    }

    shards.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), count = shards.len(), "discovered shards");
    Ok(shards)
}

/// Load every matching shard in `dir` into one table.
///
/// An unreadable or malformed shard fails the whole load.
pub fn load_dir(dir: &Path, pattern: &str) -> Result<SymbolIndex> {
    let paths = discover_shards(dir, pattern)?;
    if paths.is_empty() {
        return Err(IndexError::NoShards {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    let mut shards = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.clone(),
            source,
        })?;
        shards.push((shard_name(path), text));
    }

    let index = SymbolIndex::load_shards(shards.iter().map(|(name, text)| (name, text.as_str())))?;
    info!(dir = %dir.display(), shards = paths.len(), entries = index.len(), "loaded shard directory");
    Ok(index)
}

fn shard_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
