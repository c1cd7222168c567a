use std::collections::HashMap;

use crate::plugin::Plugin;

/// Factory producing a fresh plugin instance per load.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Registration-time table mapping plugin id to its implementation.
///
/// This replaces reflection-based module loading: the binary declares every
/// linkable plugin up front, and the on-disk manifest stubs select which of
/// them actually activate. A manifest whose id has no catalog entry is a
/// load failure for that plugin only.
#[derive(Default)]
pub struct PluginCatalog {
    factories: HashMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a plugin implementation under `id`. A repeated id replaces
    /// the earlier factory.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Produce a fresh instance for `id`, if declared.
    pub fn instantiate(&self, id: &str) -> Option<Box<dyn Plugin>> {
        self.factories.get(id).map(|f| f())
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::ServerFacade;
    use plugboard_core::Result;

    struct Nop;
    impl Plugin for Nop {
        fn setup(&mut self, _facade: &mut ServerFacade) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn register_and_instantiate() {
        let mut catalog = PluginCatalog::new();
        catalog.register("nop", || Box::new(Nop));
        assert!(catalog.contains("nop"));
        assert!(catalog.instantiate("nop").is_some());
        assert!(catalog.instantiate("other").is_none());
        assert_eq!(catalog.ids(), vec!["nop"]);
    }

    #[test]
    fn repeated_id_replaces_factory() {
        let mut catalog = PluginCatalog::new();
        catalog.register("nop", || Box::new(Nop));
        catalog.register("nop", || Box::new(Nop));
        assert_eq!(catalog.len(), 1);
    }
}
