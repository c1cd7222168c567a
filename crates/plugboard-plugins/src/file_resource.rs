use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use plugboard_core::{PlugboardError, Result};
use plugboard_host::{Plugin, ServerFacade};

/// Resource plugin: serves text file contents from a configured base
/// directory (`tool_configs.file_resource.root`, default `data`).
///
/// Paths are resolved relative to the root; absolute paths and `..`
/// components are rejected.
pub struct FileResourcePlugin;

impl Plugin for FileResourcePlugin {
    fn setup(&mut self, facade: &mut ServerFacade) -> Result<()> {
        let root = facade
            .config()
            .tool_config("file_resource")
            .get("root")
            .and_then(|v| v.as_str().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("data"));
        info!(root = %root.display(), "file resource root");

        facade.register_resource(
            "file://{path}",
            "Read a text file relative to the configured root",
            move |args| {
                let path = args.get("path").and_then(|v| v.as_str()).ok_or_else(|| {
                    PlugboardError::plugin("file_resource", "missing 'path' argument")
                })?;
                let relative = sanitize(path)?;
                let full = root.join(relative);
                debug!(path = %full.display(), "reading file resource");
                std::fs::read_to_string(&full).map_err(|e| {
                    PlugboardError::plugin("file_resource", format!("cannot read '{path}': {e}"))
                })
            },
        );
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        info!("file resource plugin shut down");
        Ok(())
    }
}

/// Reject absolute paths and any traversal outside the root.
fn sanitize(path: &str) -> Result<&Path> {
    let p = Path::new(path);
    if p.is_absolute()
        || p.components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(PlugboardError::plugin(
            "file_resource",
            format!("invalid file path: {path}"),
        ));
    }
    Ok(p)
}
