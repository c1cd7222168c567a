use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use plugboard_core::{PlugboardError, PluginKind};

use crate::tree::ConfigTree;

/// Owns the process-wide [`ConfigTree`] and its source location.
///
/// Loading never fails: a document that cannot be read or parsed is replaced
/// by [`ConfigTree::builtin_default`], so callers always get a usable store.
/// The store is shared behind an `Arc`; the lock keeps reads cheap while the
/// rare `set`/`save` mutations stay consistent.
pub struct ConfigStore {
    tree: RwLock<ConfigTree>,
    path: PathBuf,
    used_defaults: bool,
}

impl ConfigStore {
    /// Load the configuration document at `path`, falling back to defaults
    /// on any I/O or parse failure. Environment interpolation runs exactly
    /// once, here.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut used_defaults = false;
        let mut tree = match Self::read_tree(&path) {
            Ok(tree) => {
                info!(path = %path.display(), "configuration loaded");
                tree
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load configuration, using defaults");
                used_defaults = true;
                ConfigTree::builtin_default()
            }
        };
        tree.interpolate_env();
        Self {
            tree: RwLock::new(tree),
            path,
            used_defaults,
        }
    }

    /// Build a store around an existing tree (tests, embedding).
    pub fn from_tree(tree: ConfigTree, path: impl Into<PathBuf>) -> Self {
        Self {
            tree: RwLock::new(tree),
            path: path.into(),
            used_defaults: false,
        }
    }

    /// Whether `load` fell back to the built-in defaults. Callers that
    /// install their log subscriber after loading check this to surface the
    /// failure once logging is live.
    pub fn used_defaults(&self) -> bool {
        self.used_defaults
    }

    fn read_tree(path: &Path) -> plugboard_core::Result<ConfigTree> {
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        ConfigTree::from_value(value)
            .ok_or_else(|| PlugboardError::Config("document root is not a mapping".to_string()))
    }

    /// Look up a value by dotted path, cloned out of the tree.
    pub fn get(&self, dotted_path: &str) -> Option<Value> {
        self.tree.read().get(dotted_path).cloned()
    }

    /// String lookup with a default.
    pub fn get_str(&self, dotted_path: &str, default: &str) -> String {
        self.get(dotted_path)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| default.to_string())
    }

    /// Boolean lookup with a default.
    pub fn get_bool(&self, dotted_path: &str, default: bool) -> bool {
        self.get(dotted_path)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Set a value by dotted path. Values written here are not interpolated.
    pub fn set(&self, dotted_path: &str, value: Value) {
        self.tree.write().set(dotted_path, value);
    }

    /// Persist the tree back to its source location. Failure is logged and
    /// reported only through the returned flag.
    pub fn save(&self) -> bool {
        let value = self.tree.read().to_value();
        let serialized = match serde_json::to_string_pretty(&value) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to serialize configuration");
                return false;
            }
        };
        match std::fs::write(&self.path, serialized) {
            Ok(()) => {
                info!(path = %self.path.display(), "configuration saved");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to save configuration");
                false
            }
        }
    }

    /// Source path of the configuration document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Typed convenience accessors ────────────────────────────

    /// Configured directory for a plugin kind, `plugins/<kind>` by default.
    pub fn plugin_directory(&self, kind: PluginKind) -> PathBuf {
        let default = format!("plugins/{kind}");
        PathBuf::from(self.get_str(&format!("plugins.directories.{kind}"), &default))
    }

    /// Whether a plugin id appears on the disabled list. Re-reads the tree on
    /// every call so config changes take effect at the next scan.
    pub fn is_plugin_disabled(&self, plugin_id: &str) -> bool {
        self.get("plugins.disabled")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
            .iter()
            .any(|v| v.as_str() == Some(plugin_id))
    }

    /// Free-form per-plugin settings under `tool_configs.<id>`.
    pub fn tool_config(&self, plugin_id: &str) -> Map<String, Value> {
        self.get(&format!("tool_configs.{plugin_id}"))
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default()
    }

    pub fn server_name(&self) -> String {
        self.get_str("server.name", "plugboard")
    }

    pub fn transport(&self) -> String {
        self.get_str("server.transport", "stdio")
    }

    pub fn log_level(&self) -> String {
        self.get_str("server.log_level", "info")
    }

    pub fn debug(&self) -> bool {
        self.get_bool("server.debug", false)
    }

    pub fn hot_reload_enabled(&self) -> bool {
        self.get_bool("plugins.hot_reload", false)
    }

    /// Change-detection backend for hot reload: `"poll"` (default) or
    /// `"notify"` for native filesystem events.
    pub fn watch_backend(&self) -> String {
        self.get_str("plugins.watch_backend", "poll")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let store = ConfigStore::load("/nonexistent/config.json");
        assert_eq!(store.server_name(), "plugboard");
        assert_eq!(store.transport(), "stdio");
        assert!(!store.hot_reload_enabled());
        assert!(store.used_defaults());
    }

    #[test]
    fn load_invalid_json_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::load(&path);
        assert_eq!(store.server_name(), "plugboard");
        assert!(store.used_defaults());
    }

    #[test]
    fn load_non_mapping_root_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let store = ConfigStore::load(&path);
        assert_eq!(store.server_name(), "plugboard");
        assert!(store.used_defaults());
    }

    #[test]
    fn watch_backend_defaults_to_poll() {
        let store = ConfigStore::load("/nonexistent/config.json");
        assert_eq!(store.watch_backend(), "poll");
        store.set("plugins.watch_backend", json!("notify"));
        assert_eq!(store.watch_backend(), "notify");
    }

    #[test]
    fn load_reads_document_and_interpolates() {
        unsafe {
            std::env::set_var("PLUGBOARD_STORE_TEST", "from-env");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "server": { "name": "custom", "token": "${PLUGBOARD_STORE_TEST}" } }"#,
        )
        .unwrap();
        let store = ConfigStore::load(&path);
        assert!(!store.used_defaults());
        assert_eq!(store.server_name(), "custom");
        assert_eq!(store.get("server.token"), Some(json!("from-env")));
    }

    #[test]
    fn set_is_not_interpolated() {
        let store = ConfigStore::load("/nonexistent/config.json");
        store.set("server.late", json!("${HOME}"));
        assert_eq!(store.get("server.late"), Some(json!("${HOME}")));
    }

    #[test]
    fn save_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "server": { "name": "persisted" } }"#).unwrap();
        let store = ConfigStore::load(&path);
        store.set("plugins.hot_reload", json!(true));
        assert!(store.save());

        let reloaded = ConfigStore::load(&path);
        assert_eq!(reloaded.server_name(), "persisted");
        assert!(reloaded.hot_reload_enabled());
    }

    #[test]
    fn save_to_unwritable_path_reports_false() {
        let store = ConfigStore::load("/nonexistent/dir/config.json");
        assert!(!store.save());
    }

    #[test]
    fn plugin_directory_defaults_per_kind() {
        let store = ConfigStore::load("/nonexistent/config.json");
        assert_eq!(
            store.plugin_directory(PluginKind::Tools),
            PathBuf::from("plugins/tools")
        );

        store.set("plugins.directories.tools", json!("custom/tools"));
        assert_eq!(
            store.plugin_directory(PluginKind::Tools),
            PathBuf::from("custom/tools")
        );
    }

    #[test]
    fn disabled_list_membership() {
        let store = ConfigStore::load("/nonexistent/config.json");
        assert!(!store.is_plugin_disabled("calculator"));
        store.set("plugins.disabled", json!(["calculator"]));
        assert!(store.is_plugin_disabled("calculator"));
        assert!(!store.is_plugin_disabled("planning"));
    }

    #[test]
    fn tool_config_defaults_to_empty() {
        let store = ConfigStore::load("/nonexistent/config.json");
        assert!(store.tool_config("calculator").is_empty());
        store.set("tool_configs.calculator", json!({ "precision": 4 }));
        assert_eq!(
            store.tool_config("calculator").get("precision"),
            Some(&json!(4))
        );
    }
}
