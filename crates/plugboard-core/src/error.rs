use thiserror::Error;

/// Unified error type for the plugboard host.
#[derive(Error, Debug)]
pub enum PlugboardError {
    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Plugin lifecycle errors ────────────────────────────────
    #[error("plugin error: {plugin}: {reason}")]
    Plugin { plugin: String, reason: String },

    #[error("plugin not loaded: {0}")]
    NotLoaded(String),

    #[error("cannot determine plugin kind: {0}")]
    UnknownKind(String),

    // ── Hot reload errors ──────────────────────────────────────
    #[error("watcher error: {0}")]
    Watcher(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlugboardError {
    /// Shorthand for a per-plugin failure.
    pub fn plugin(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlugboardError>;
