//! # plugboard-plugins
//!
//! Built-in plugins, one per kind. Each is an ordinary value implementing
//! the [`plugboard_host::Plugin`] contract; [`builtin_catalog`] declares them
//! all so the matching manifest stubs under `plugins/<kind>/` can activate
//! them.

pub mod calculator;
pub mod file_editor;
pub mod file_resource;
pub mod planning;
pub mod static_sampler;

pub use calculator::CalculatorPlugin;
pub use file_editor::FileEditorPlugin;
pub use file_resource::FileResourcePlugin;
pub use planning::PlanningPlugin;
pub use static_sampler::StaticSamplerPlugin;

use plugboard_host::PluginCatalog;

/// Catalog of every built-in plugin, keyed by the id its manifest stub uses.
pub fn builtin_catalog() -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    catalog.register("calculator", || Box::new(CalculatorPlugin));
    catalog.register("file_editor", || Box::new(FileEditorPlugin));
    catalog.register("file_resource", || Box::new(FileResourcePlugin));
    catalog.register("planning", || Box::new(PlanningPlugin));
    catalog.register("static_sampler", || Box::new(StaticSamplerPlugin));
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_declares_all_builtins() {
        let catalog = builtin_catalog();
        assert_eq!(
            catalog.ids(),
            vec![
                "calculator",
                "file_editor",
                "file_resource",
                "planning",
                "static_sampler"
            ]
        );
    }
}
