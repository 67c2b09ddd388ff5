use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use glob::Pattern;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use super::handle::IndexHandle;
use crate::error::Result;

/// Reloads an `IndexHandle` whenever shard files in its directory change.
///
/// Stops when dropped.
pub struct ShardWatcher {
    _watcher: RecommendedWatcher,
}

impl ShardWatcher {
    pub fn new(
        handle: IndexHandle,
        dir: &Path,
        pattern: &str,
        debounce: Duration,
    ) -> Result<Self> {
        let matcher = Pattern::new(pattern)?;
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => warn!(error = %e, "shard watcher error"),
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!(dir = %dir.display(), pattern, "watching shard directory");

        let reload = ReloadTarget {
            handle,
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
            matcher,
        };
        std::thread::spawn(move || {
            debounced_reload_loop(reload, rx, debounce);
        });

        Ok(Self { _watcher: watcher })
    }
}

struct ReloadTarget {
    handle: IndexHandle,
    dir: PathBuf,
    pattern: String,
    matcher: Pattern,
}

impl ReloadTarget {
    fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| self.matcher.matches(n))
                .unwrap_or(false)
        })
    }
}

fn debounced_reload_loop(target: ReloadTarget, rx: mpsc::Receiver<Event>, debounce: Duration) {
    let mut pending = false;
    let mut last_change = Instant::now();
    let poll = debounce.min(Duration::from_millis(500)).max(Duration::from_millis(10));

    loop {
        match rx.recv_timeout(poll) {
            Ok(event) => {
                if target.is_relevant(&event) {
                    debug!(paths = ?event.paths, "shard change");
                    pending = true;
                    last_change = Instant::now();
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                debug!("shard watcher stopped");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if pending && last_change.elapsed() >= debounce {
                    pending = false;
                    // Failure is logged by the handle; the old table stays.
                    let _ = target.handle.reload_from_dir(&target.dir, &target.pattern);
                }
            }
        }
    }
}
