use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use plugboard_config::ConfigStore;
use plugboard_core::{PlugboardError, PluginId, PluginKind, Result};

use crate::loader::manifest_candidates;

/// Default poll interval between watcher cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One observed plugin source change, forwarded to the loader's task.
#[derive(Debug, Clone)]
pub struct PluginChange {
    pub id: PluginId,
    pub path: PathBuf,
    pub kind: PluginKind,
}

/// Strategy for observing plugin source changes.
///
/// Polling satisfies this today; a native filesystem-event mechanism can
/// satisfy it later without changing the loader's contract. `scan` must
/// handle per-file errors internally and never fail the cycle.
pub trait ChangeSource: Send {
    fn scan(&mut self, dirs: &[(PluginKind, PathBuf)]) -> Vec<PluginChange>;
}

/// Polls directory contents and compares modification times.
///
/// The modification index is advisory: rebuilt against the filesystem on
/// every cycle and never persisted.
#[derive(Default)]
pub struct PollingSource {
    mtimes: HashMap<PathBuf, SystemTime>,
}

impl PollingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation; returns true when the path is unseen or its
    /// modification time differs from the last record.
    fn observe(&mut self, path: &Path, mtime: SystemTime) -> bool {
        match self.mtimes.insert(path.to_path_buf(), mtime) {
            Some(previous) => previous != mtime,
            None => true,
        }
    }
}

impl ChangeSource for PollingSource {
    fn scan(&mut self, dirs: &[(PluginKind, PathBuf)]) -> Vec<PluginChange> {
        let mut changes = Vec::new();
        for (kind, dir) in dirs {
            if !dir.exists() {
                continue;
            }
            for (id, path) in manifest_candidates(dir) {
                let mtime = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                    Ok(mtime) => mtime,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "cannot stat plugin file");
                        continue;
                    }
                };
                if self.observe(&path, mtime) {
                    changes.push(PluginChange {
                        id,
                        path,
                        kind: *kind,
                    });
                }
            }
        }
        changes
    }
}

/// Filesystem-event backed source. Events are collected by a `notify`
/// watcher and drained on each `scan`; directories are (un)watched as the
/// configured set changes.
pub struct NotifySource {
    watcher: notify::RecommendedWatcher,
    rx: std::sync::mpsc::Receiver<PathBuf>,
    watched: HashSet<PathBuf>,
}

impl NotifySource {
    pub fn new() -> Result<Self> {
        let (tx, rx) = std::sync::mpsc::channel();
        let watcher = notify::recommended_watcher(
            move |res: std::result::Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in event.paths {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "file watcher error"),
            },
        )
        .map_err(|e| PlugboardError::Watcher(e.to_string()))?;

        Ok(Self {
            watcher,
            rx,
            watched: HashSet::new(),
        })
    }

    fn sync_watches(&mut self, dirs: &[(PluginKind, PathBuf)]) {
        let current: HashSet<PathBuf> = dirs
            .iter()
            .filter(|(_, d)| d.exists())
            .map(|(_, d)| d.clone())
            .collect();

        let to_watch: Vec<PathBuf> = current.difference(&self.watched).cloned().collect();
        for dir in to_watch {
            match self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    debug!(dir = %dir.display(), "watching plugin directory");
                    self.watched.insert(dir);
                }
                Err(e) => warn!(dir = %dir.display(), error = %e, "failed to watch plugin directory"),
            }
        }
        let to_unwatch: Vec<PathBuf> = self.watched.difference(&current).cloned().collect();
        for dir in to_unwatch {
            let _ = self.watcher.unwatch(&dir);
            self.watched.remove(&dir);
        }
    }
}

impl ChangeSource for NotifySource {
    fn scan(&mut self, dirs: &[(PluginKind, PathBuf)]) -> Vec<PluginChange> {
        self.sync_watches(dirs);

        let mut changes = Vec::new();
        let mut seen = HashSet::new();
        while let Ok(path) = self.rx.try_recv() {
            if path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.starts_with('_'))
                .map(str::to_string)
            else {
                continue;
            };
            let Some(kind) = dirs
                .iter()
                .find(|(_, dir)| path.parent() == Some(dir.as_path()))
                .map(|(kind, _)| *kind)
            else {
                continue;
            };
            if seen.insert(path.clone()) {
                changes.push(PluginChange { id, path, kind });
            }
        }
        changes
    }
}

/// Background task that drives a [`ChangeSource`] on a fixed interval and
/// forwards observed changes over a channel to the task owning the loader.
///
/// Message passing keeps registry mutations on a single control flow; the
/// watcher itself never touches the registry. The task stops when the
/// receiving side is dropped.
pub struct HotReloadWatcher;

impl HotReloadWatcher {
    pub fn spawn<S>(
        config: Arc<ConfigStore>,
        mut source: S,
        tx: mpsc::Sender<PluginChange>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()>
    where
        S: ChangeSource + 'static,
    {
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs_f64(), "hot reload watcher started");
            loop {
                if tx.is_closed() {
                    debug!("change receiver dropped, stopping watcher");
                    return;
                }

                // The directory list is recomputed from live configuration
                // each cycle, so directory changes via set/save take effect
                // without a restart.
                let dirs: Vec<(PluginKind, PathBuf)> = PluginKind::ALL
                    .into_iter()
                    .map(|kind| (kind, config.plugin_directory(kind)))
                    .collect();

                for change in source.scan(&dirs) {
                    if tx.send(change).await.is_err() {
                        debug!("change receiver dropped, stopping watcher");
                        return;
                    }
                }

                tokio::time::sleep(interval).await;
            }
        })
    }
}
