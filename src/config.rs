use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::symbol_index::{MatchMode, DEFAULT_SHARD_PATTERN};

/// Environment variable that overrides `shard_dir`
pub const SHARD_DIR_ENV: &str = "DOCSYM_SHARD_DIR";

/// Settings for loading and querying a documentation index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the search shards (e.g. `html/search`)
    #[serde(default)]
    pub shard_dir: Option<PathBuf>,
    #[serde(default = "default_shard_pattern")]
    pub shard_pattern: String,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Reload automatically when shards change
    #[serde(default)]
    pub watch: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            shard_dir: None,
            shard_pattern: default_shard_pattern(),
            match_mode: MatchMode::default(),
            default_limit: default_limit(),
            watch: false,
            debounce_ms: default_debounce_ms(),
            log_level: default_log_level(),
        }
    }
}

impl IndexConfig {
    /// Shard directory, with the environment override applied
    pub fn resolved_shard_dir(&self) -> Option<PathBuf> {
        self.shard_dir_with_override(std::env::var_os(SHARD_DIR_ENV))
    }

    /// `overridden` wins unless it is unset or empty.
    pub(crate) fn shard_dir_with_override(&self, overridden: Option<OsString>) -> Option<PathBuf> {
        overridden
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.shard_dir.clone())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_shard_pattern() -> String {
    DEFAULT_SHARD_PATTERN.to_string()
}

fn default_limit() -> usize {
    50
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_config_path() -> PathBuf {
    let Some(dirs) = ProjectDirs::from("org", "docsym", "docsym") else {
        return Path::new("docsym.json").to_path_buf();
    };
    dirs.config_dir().join("settings.json")
}

/// Read the config at `path`. A missing file gives defaults; a file that
/// exists but does not parse is an error.
pub fn load_config(path: &Path) -> Result<IndexConfig> {
    let Ok(bytes) = fs::read(path) else {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(IndexConfig::default());
    };
    serde_json::from_slice::<IndexConfig>(&bytes)
        .map_err(|e| IndexError::Config(format!("{}: {}", path.display(), e)))
}

pub fn save_config(path: &Path, cfg: &IndexConfig) -> Result<()> {
    let json = serde_json::to_vec_pretty(cfg).map_err(|e| IndexError::Config(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| IndexError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })
}
