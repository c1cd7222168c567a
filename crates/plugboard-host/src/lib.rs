//! # plugboard-host
//!
//! The plugin lifecycle manager. Plugins are statically linked values
//! implementing the [`Plugin`] trait, declared in a [`PluginCatalog`] and
//! activated by on-disk manifest stubs.
//!
//! ## Plugin manifest
//!
//! Each kind directory (`plugins/tools`, `plugins/resources`, ...) holds one
//! `<id>.toml` stub per plugin; the file stem is the plugin id and its
//! presence is what makes the catalog entry eligible for loading:
//!
//! ```toml
//! [plugin]
//! name = "calculator"
//! version = "1.0.0"
//! description = "Evaluate arithmetic expressions"
//! ```
//!
//! Deleting the stub (or listing the id under `plugins.disabled`) keeps the
//! plugin out of the registry without touching code.

pub mod catalog;
pub mod facade;
pub mod loader;
pub mod manifest;
pub mod plugin;
pub mod registry;
pub mod watcher;

pub use catalog::PluginCatalog;
pub use facade::ServerFacade;
pub use loader::PluginLoader;
pub use manifest::PluginManifest;
pub use plugin::Plugin;
pub use registry::{PluginRecord, PluginRegistry};
pub use watcher::{ChangeSource, HotReloadWatcher, NotifySource, PluginChange, PollingSource};
