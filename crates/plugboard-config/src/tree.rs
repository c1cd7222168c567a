use serde_json::{Map, Value, json};
use tracing::debug;

/// A nested configuration mapping with dotted-path accessors.
///
/// The shape is fixed once loaded; values are queried through dotted paths
/// (`"server.name"`) and a missing key at any depth yields the caller's
/// default, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// Build a tree from a parsed JSON document. Non-object roots are
    /// rejected; the configuration document must be a mapping.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    /// The built-in default configuration, used when loading fails.
    pub fn builtin_default() -> Self {
        let root = json!({
            "server": {
                "name": "plugboard",
                "transport": "stdio",
                "log_level": "info",
                "debug": true
            },
            "plugins": {
                "directories": {
                    "resources": "plugins/resources",
                    "prompts": "plugins/prompts",
                    "tools": "plugins/tools",
                    "sampling": "plugins/sampling"
                },
                "hot_reload": false,
                "disabled": []
            }
        });
        match root {
            Value::Object(root) => Self { root },
            _ => unreachable!("default config is an object"),
        }
    }

    /// Look up a value by dotted path. Returns `None` the moment a key is
    /// absent or an intermediate value is not a mapping.
    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut current: &Value = &Value::Null;
        for (i, key) in dotted_path.split('.').enumerate() {
            let map = if i == 0 {
                &self.root
            } else {
                current.as_object()?
            };
            current = map.get(key)?;
        }
        Some(current)
    }

    /// Set a value by dotted path, creating intermediate mappings as needed.
    /// An existing non-mapping intermediate is replaced by a mapping.
    pub fn set(&mut self, dotted_path: &str, value: Value) {
        let keys: Vec<&str> = dotted_path.split('.').collect();
        let mut current = &mut self.root;
        for key in &keys[..keys.len() - 1] {
            let slot = current
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                return;
            };
            current = next;
        }
        current.insert(keys[keys.len() - 1].to_string(), value);
    }

    /// Replace every string leaf of the exact form `${NAME}` with the value
    /// of the `NAME` environment variable, or the empty string when unset.
    ///
    /// Only nested mappings are walked; sequence elements are left untouched.
    /// Runs once at load time; values written later via `set` are not
    /// interpolated.
    pub fn interpolate_env(&mut self) {
        interpolate_map(&mut self.root);
    }

    /// Serialize the tree back to a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::builtin_default()
    }
}

fn interpolate_map(map: &mut Map<String, Value>) {
    for (_, value) in map.iter_mut() {
        match value {
            Value::Object(nested) => interpolate_map(nested),
            Value::String(s) if s.starts_with("${") && s.ends_with('}') => {
                let name = s[2..s.len() - 1].to_string();
                let resolved = std::env::var(&name).unwrap_or_default();
                debug!(var = %name, "substituted environment variable");
                *value = Value::String(resolved);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(value: Value) -> ConfigTree {
        ConfigTree::from_value(value).unwrap()
    }

    #[test]
    fn get_walks_dotted_paths() {
        let t = tree(json!({ "a": { "b": { "c": 42 } } }));
        assert_eq!(t.get("a.b.c"), Some(&json!(42)));
        assert_eq!(t.get("a.b"), Some(&json!({ "c": 42 })));
    }

    #[test]
    fn get_missing_at_every_depth_is_none() {
        let t = tree(json!({ "a": { "b": { "c": 1 } } }));
        assert_eq!(t.get("x.b.c"), None);
        assert_eq!(t.get("a.x.c"), None);
        assert_eq!(t.get("a.b.x"), None);
    }

    #[test]
    fn get_through_non_mapping_intermediate_is_none() {
        let t = tree(json!({ "a": { "b": "leaf" } }));
        assert_eq!(t.get("a.b.c"), None);
    }

    #[test]
    fn set_creates_intermediates() {
        let mut t = tree(json!({}));
        t.set("a.b.c", json!(true));
        assert_eq!(t.get("a.b.c"), Some(&json!(true)));
    }

    #[test]
    fn set_overwrites_leaf_and_non_mapping_intermediate() {
        let mut t = tree(json!({ "a": "scalar" }));
        t.set("a.b", json!(1));
        assert_eq!(t.get("a.b"), Some(&json!(1)));
        t.set("a.b", json!(2));
        assert_eq!(t.get("a.b"), Some(&json!(2)));
    }

    #[test]
    fn set_replaces_deep_non_mapping_intermediate() {
        let mut t = tree(json!({ "a": { "b": 7 } }));
        t.set("a.b.c.d", json!("x"));
        assert_eq!(t.get("a.b.c.d"), Some(&json!("x")));
    }

    #[test]
    fn interpolation_replaces_exact_form_only() {
        unsafe {
            std::env::set_var("PLUGBOARD_TEST_FOO", "bar");
        }
        let mut t = tree(json!({
            "a": "${PLUGBOARD_TEST_FOO}",
            "b": "prefix ${PLUGBOARD_TEST_FOO}",
            "nested": { "c": "${PLUGBOARD_TEST_FOO}" }
        }));
        t.interpolate_env();
        assert_eq!(t.get("a"), Some(&json!("bar")));
        assert_eq!(t.get("b"), Some(&json!("prefix ${PLUGBOARD_TEST_FOO}")));
        assert_eq!(t.get("nested.c"), Some(&json!("bar")));
    }

    #[test]
    fn interpolation_of_unset_variable_yields_empty_string() {
        let mut t = tree(json!({ "a": "${PLUGBOARD_TEST_DEFINITELY_UNSET}" }));
        t.interpolate_env();
        assert_eq!(t.get("a"), Some(&json!("")));
    }

    #[test]
    fn interpolation_skips_sequence_elements() {
        unsafe {
            std::env::set_var("PLUGBOARD_TEST_SEQ", "resolved");
        }
        let mut t = tree(json!({ "list": ["${PLUGBOARD_TEST_SEQ}"] }));
        t.interpolate_env();
        // Sequence elements are not walked.
        assert_eq!(t.get("list"), Some(&json!(["${PLUGBOARD_TEST_SEQ}"])));
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(ConfigTree::from_value(json!([1, 2])).is_none());
        assert!(ConfigTree::from_value(json!("str")).is_none());
    }
}
