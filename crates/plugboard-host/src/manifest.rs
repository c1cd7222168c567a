use serde::{Deserialize, Serialize};

/// Plugin manifest stub, loaded from `<id>.toml` in a kind directory.
///
/// All metadata is optional; the id comes from the file stem and the code
/// from the catalog, so an empty file is a valid manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginManifest {
    #[serde(default)]
    pub plugin: PluginMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PluginManifest {
    /// Parse from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_is_valid() {
        let m = PluginManifest::from_toml("").unwrap();
        assert!(m.plugin.name.is_none());
        assert!(m.plugin.description.is_none());
    }

    #[test]
    fn metadata_is_parsed() {
        let m = PluginManifest::from_toml(
            r#"
[plugin]
name = "calculator"
version = "1.0.0"
description = "Evaluate arithmetic expressions"
"#,
        )
        .unwrap();
        assert_eq!(m.plugin.name.as_deref(), Some("calculator"));
        assert_eq!(m.plugin.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn malformed_manifest_errors() {
        assert!(PluginManifest::from_toml("[plugin\nname=").is_err());
    }
}
