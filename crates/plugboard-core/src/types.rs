use serde::{Deserialize, Serialize};

/// Unique identifier for a plugin, derived from its manifest file stem.
pub type PluginId = String;

/// The category of capability a plugin contributes to the host.
///
/// Each kind has its own configured directory (`plugins.directories.<kind>`)
/// and its own registration surface on the server facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Resources,
    Prompts,
    Tools,
    Sampling,
}

impl PluginKind {
    /// All kinds, in the order they are scanned during a full load.
    pub const ALL: [PluginKind; 4] = [
        PluginKind::Resources,
        PluginKind::Prompts,
        PluginKind::Tools,
        PluginKind::Sampling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Resources => "resources",
            PluginKind::Prompts => "prompts",
            PluginKind::Tools => "tools",
            PluginKind::Sampling => "sampling",
        }
    }

    /// The `kind.id` identity key that uniquely names an active instance.
    pub fn identity(&self, id: &str) -> String {
        format!("{}.{}", self.as_str(), id)
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
