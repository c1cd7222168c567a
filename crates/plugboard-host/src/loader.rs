use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use plugboard_config::ConfigStore;
use plugboard_core::{PlugboardError, PluginId, PluginKind, Result};

use crate::catalog::PluginCatalog;
use crate::facade::ServerFacade;
use crate::manifest::PluginManifest;
use crate::registry::{PluginRecord, PluginRegistry};
use crate::watcher::PluginChange;

/// List the `(id, path)` manifest candidates in a kind directory: files with
/// a `.toml` extension whose stem does not start with `_` (internal files).
/// Results are sorted by id for deterministic load order.
pub fn manifest_candidates(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to read plugin directory");
            return Vec::new();
        }
    };

    let mut candidates: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            (!stem.starts_with('_')).then_some((stem, path))
        })
        .collect();
    candidates.sort();
    candidates
}

/// Discovers candidate plugins per kind directory and drives the
/// load/reload/unload lifecycle against the registry.
///
/// The loader owns the facade and the registry and is the only mutator of
/// both; the hot-reload watcher communicates with it through messages, never
/// directly.
pub struct PluginLoader {
    facade: ServerFacade,
    registry: PluginRegistry,
    catalog: PluginCatalog,
    config: Arc<ConfigStore>,
}

impl PluginLoader {
    pub fn new(facade: ServerFacade, catalog: PluginCatalog, config: Arc<ConfigStore>) -> Self {
        Self {
            facade,
            registry: PluginRegistry::new(),
            catalog,
            config,
        }
    }

    pub fn facade(&self) -> &ServerFacade {
        &self.facade
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Load every discovered plugin of every kind. Failures are isolated per
    /// file; one bad plugin never prevents the rest from loading.
    pub fn load_all(&mut self) {
        for kind in PluginKind::ALL {
            self.load_kind(kind);
        }
    }

    /// Scan one kind's configured directory and load its candidates.
    pub fn load_kind(&mut self, kind: PluginKind) {
        let dir = self.config.plugin_directory(kind);
        if !dir.exists() {
            warn!(dir = %dir.display(), %kind, "plugin directory does not exist");
            return;
        }

        info!(%kind, dir = %dir.display(), "loading plugins");
        for (id, path) in manifest_candidates(&dir) {
            if let Err(e) = self.load(&id, &path, kind) {
                warn!(plugin = %id, error = %e, "failed to load plugin");
            }
        }
    }

    /// Load a single plugin.
    ///
    /// Already-active identities are a silent no-op and disabled ids are
    /// skipped with a log line; neither is an error. A missing catalog entry,
    /// an unparseable manifest, or a failing `setup` is an error for this
    /// plugin only, and leaves the registry untouched.
    pub fn load(&mut self, id: &str, path: &Path, kind: PluginKind) -> Result<()> {
        let identity = kind.identity(id);
        if self.registry.has_identity(&identity) {
            debug!(%identity, "plugin already active, skipping");
            return Ok(());
        }

        if self.config.is_plugin_disabled(id) {
            info!(plugin = id, "skipping disabled plugin");
            return Ok(());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| PlugboardError::plugin(id, format!("cannot read manifest: {e}")))?;
        let manifest = PluginManifest::from_toml(&raw)
            .map_err(|e| PlugboardError::plugin(id, format!("invalid manifest: {e}")))?;

        let mut instance = self
            .catalog
            .instantiate(id)
            .ok_or_else(|| PlugboardError::plugin(id, "no catalog entry for plugin id"))?;

        instance
            .setup(&mut self.facade)
            .map_err(|e| PlugboardError::plugin(id, format!("setup failed: {e}")))?;

        let record = PluginRecord {
            id: id.to_string(),
            kind,
            source_path: path.to_path_buf(),
            module_identity: identity,
            loaded_at: Utc::now(),
            description: manifest.plugin.description,
        };
        info!(plugin = id, %kind, "plugin loaded");
        self.registry.insert(record, instance);
        Ok(())
    }

    /// Replace an active plugin with a fresh instance from the same source.
    ///
    /// The outgoing instance is dropped without `teardown`: reload is the
    /// fast path and the incoming `setup` registers over the old surface.
    pub fn reload(&mut self, id: &str) -> Result<()> {
        let Some(record) = self.registry.get(id).cloned() else {
            warn!(plugin = id, "plugin not loaded, cannot reload");
            return Err(PlugboardError::NotLoaded(id.to_string()));
        };

        // The kind is re-derived from the configured directory prefixes
        // rather than trusted from the record; directories may have been
        // reconfigured since the original load.
        let kind = PluginKind::ALL
            .into_iter()
            .find(|k| record.source_path.starts_with(self.config.plugin_directory(*k)));
        let Some(kind) = kind else {
            warn!(plugin = id, path = %record.source_path.display(), "cannot determine plugin kind");
            return Err(PlugboardError::UnknownKind(id.to_string()));
        };

        self.registry.remove(id);
        self.load(id, &record.source_path, kind)?;
        if !self.registry.contains(id) {
            return Err(PlugboardError::plugin(
                id,
                "reload did not produce an active instance",
            ));
        }
        info!(plugin = id, "plugin reloaded");
        Ok(())
    }

    /// Tear down and remove an active plugin. A failing `teardown` is logged
    /// but never blocks removal.
    pub fn unload(&mut self, id: &str) -> Result<()> {
        if !self.registry.contains(id) {
            warn!(plugin = id, "plugin not loaded, cannot unload");
            return Err(PlugboardError::NotLoaded(id.to_string()));
        }

        if let Some(active) = self.registry.get_mut(id)
            && let Err(e) = active.instance.teardown()
        {
            warn!(plugin = id, error = %e, "teardown failed");
        }
        self.registry.remove(id);
        info!(plugin = id, "plugin unloaded");
        Ok(())
    }

    /// Snapshot of currently loaded plugins, id → record.
    pub fn loaded(&self) -> HashMap<PluginId, PluginRecord> {
        self.registry.snapshot()
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Apply one change observed by the hot-reload watcher: reload the
    /// plugin if it is active, otherwise attempt a first load.
    pub fn apply_change(&mut self, change: &PluginChange) {
        if self.is_loaded(&change.id) {
            info!(plugin = %change.id, "plugin source changed, reloading");
            if let Err(e) = self.reload(&change.id) {
                warn!(plugin = %change.id, error = %e, "reload failed");
            }
        } else {
            info!(plugin = %change.id, kind = %change.kind, "new plugin detected, loading");
            if let Err(e) = self.load(&change.id, &change.path, change.kind) {
                warn!(plugin = %change.id, error = %e, "load failed");
            }
        }
    }
}
