use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::{debug, info};

use plugboard_core::{PlugboardError, Result};
use plugboard_host::{Plugin, ServerFacade};

/// Tool plugin: view, create, and edit text files under a configured base
/// directory (`tool_configs.file_editor.root`, default `data`).
///
/// Commands: `view` (optional 1-based `view_range`), `create`,
/// `str_replace` (the old string must match exactly once), `insert`
/// (after `insert_line`, 0 prepends), and `undo_edit`. Every mutation pushes
/// the previous content onto a per-file history so `undo_edit` can restore
/// it. Paths are resolved relative to the root; absolute paths and `..`
/// components are rejected.
pub struct FileEditorPlugin;

type History = Arc<Mutex<HashMap<PathBuf, Vec<String>>>>;

impl Plugin for FileEditorPlugin {
    fn setup(&mut self, facade: &mut ServerFacade) -> Result<()> {
        let root = facade
            .config()
            .tool_config("file_editor")
            .get("root")
            .and_then(|v| v.as_str().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("data"));
        info!(root = %root.display(), "file editor root");

        let history: History = Arc::new(Mutex::new(HashMap::new()));
        facade.register_tool(
            "file_editor",
            "View, create, and edit text files under the data root",
            move |args| {
                let command = require_str(args, "command")?;
                let path = require_str(args, "path")?;
                let full = root.join(sanitize(path)?);
                debug!(%command, path = %full.display(), "file editor command");
                match command {
                    "view" => view(&full, args.get("view_range")),
                    "create" => create(&full, args, &history),
                    "str_replace" => str_replace(&full, args, &history),
                    "insert" => insert(&full, args, &history),
                    "undo_edit" => undo_edit(&full, &history),
                    other => Err(editor_error(format!(
                        "unknown command: {other}; supported: view, create, str_replace, insert, undo_edit"
                    ))),
                }
            },
        );
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        info!("file editor plugin shut down");
        Ok(())
    }
}

fn editor_error(reason: impl Into<String>) -> PlugboardError {
    PlugboardError::plugin("file_editor", reason)
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| editor_error(format!("missing '{key}' argument")))
}

/// Reject absolute paths and any traversal outside the root.
fn sanitize(path: &str) -> Result<&Path> {
    let p = Path::new(path);
    if p.is_absolute()
        || p.components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(editor_error(format!("invalid file path: {path}")));
    }
    Ok(p)
}

fn remember(path: &Path, content: String, history: &History) {
    history
        .lock()
        .entry(path.to_path_buf())
        .or_default()
        .push(content);
}

fn view(path: &Path, range: Option<&Value>) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let Some(range) = range else {
        return Ok(json!({ "content": content }));
    };

    let bounds: Vec<i64> = range
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    let [start, end] = bounds[..] else {
        return Err(editor_error("view_range must be [start, end]"));
    };

    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len() as i64;
    if start < 1 || start > total {
        return Err(editor_error(format!(
            "start line {start} out of range 1..={total}"
        )));
    }
    // -1 means "to the end of the file".
    let end = if end == -1 { total } else { end };
    if end < start || end > total {
        return Err(editor_error(format!(
            "end line {end} out of range {start}..={total}"
        )));
    }
    let slice = lines[(start - 1) as usize..end as usize].join("\n");
    Ok(json!({ "content": slice }))
}

fn create(path: &Path, args: &Value, history: &History) -> Result<Value> {
    let text = require_str(args, "file_text")?;
    if let Ok(previous) = std::fs::read_to_string(path) {
        remember(path, previous, history);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(json!({ "message": format!("created {}", path.display()) }))
}

fn str_replace(path: &Path, args: &Value, history: &History) -> Result<Value> {
    let old = require_str(args, "old_str")?;
    let new = args.get("new_str").and_then(Value::as_str).unwrap_or("");
    let content = std::fs::read_to_string(path)?;
    match content.matches(old).count() {
        0 => return Err(editor_error("old_str not found in file")),
        1 => {}
        n => {
            return Err(editor_error(format!(
                "old_str matches {n} times, must be unique"
            )));
        }
    }
    let edited = content.replacen(old, new, 1);
    remember(path, content, history);
    std::fs::write(path, edited)?;
    Ok(json!({ "message": "replaced 1 occurrence" }))
}

fn insert(path: &Path, args: &Value, history: &History) -> Result<Value> {
    let line = args
        .get("insert_line")
        .and_then(Value::as_u64)
        .ok_or_else(|| editor_error("missing 'insert_line' argument"))? as usize;
    let text = require_str(args, "new_str")?;
    let content = std::fs::read_to_string(path)?;

    let mut lines: Vec<&str> = content.lines().collect();
    if line > lines.len() {
        return Err(editor_error(format!(
            "insert_line {line} out of range 0..={}",
            lines.len()
        )));
    }
    lines.insert(line, text);
    let edited = lines.join("\n");
    remember(path, content.clone(), history);
    std::fs::write(path, edited)?;
    Ok(json!({ "message": format!("inserted after line {line}") }))
}

fn undo_edit(path: &Path, history: &History) -> Result<Value> {
    let previous = history
        .lock()
        .get_mut(path)
        .and_then(|stack| stack.pop())
        .ok_or_else(|| editor_error("no edit history for file"))?;
    std::fs::write(path, previous)?;
    Ok(json!({ "message": format!("reverted last edit to {}", path.display()) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugboard_config::ConfigStore;

    fn facade_with_root(root: &Path) -> ServerFacade {
        let config = Arc::new(ConfigStore::load("/nonexistent/config.json"));
        config.set(
            "tool_configs.file_editor",
            json!({ "root": root.to_str().unwrap() }),
        );
        let mut facade = ServerFacade::new("test", config);
        FileEditorPlugin.setup(&mut facade).unwrap();
        facade
    }

    fn edit(facade: &ServerFacade, args: Value) -> Result<Value> {
        facade.call_tool("file_editor", &args)
    }

    #[test]
    fn create_then_view_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let facade = facade_with_root(dir.path());

        edit(
            &facade,
            json!({ "command": "create", "path": "a.txt", "file_text": "one\ntwo\nthree" }),
        )
        .unwrap();

        let full = edit(&facade, json!({ "command": "view", "path": "a.txt" })).unwrap();
        assert_eq!(full["content"], json!("one\ntwo\nthree"));

        let ranged = edit(
            &facade,
            json!({ "command": "view", "path": "a.txt", "view_range": [2, 2] }),
        )
        .unwrap();
        assert_eq!(ranged["content"], json!("two"));

        let tail = edit(
            &facade,
            json!({ "command": "view", "path": "a.txt", "view_range": [2, -1] }),
        )
        .unwrap();
        assert_eq!(tail["content"], json!("two\nthree"));
    }

    #[test]
    fn view_range_bounds_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "only").unwrap();
        let facade = facade_with_root(dir.path());

        for bad in [json!([0, 1]), json!([2, 2]), json!([1, 5]), json!([1])] {
            assert!(
                edit(
                    &facade,
                    json!({ "command": "view", "path": "a.txt", "view_range": bad })
                )
                .is_err()
            );
        }
    }

    #[test]
    fn str_replace_requires_a_unique_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x = 1\ny = 1\n").unwrap();
        let facade = facade_with_root(dir.path());

        let err = edit(
            &facade,
            json!({ "command": "str_replace", "path": "a.txt", "old_str": "= 1", "new_str": "= 2" }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be unique"));

        edit(
            &facade,
            json!({ "command": "str_replace", "path": "a.txt", "old_str": "x = 1", "new_str": "x = 2" }),
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "x = 2\ny = 1\n"
        );

        assert!(
            edit(
                &facade,
                json!({ "command": "str_replace", "path": "a.txt", "old_str": "absent" }),
            )
            .is_err()
        );
    }

    #[test]
    fn insert_adds_a_line_at_the_given_position() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\nthree").unwrap();
        let facade = facade_with_root(dir.path());

        edit(
            &facade,
            json!({ "command": "insert", "path": "a.txt", "insert_line": 1, "new_str": "two" }),
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "one\ntwo\nthree"
        );

        assert!(
            edit(
                &facade,
                json!({ "command": "insert", "path": "a.txt", "insert_line": 99, "new_str": "x" }),
            )
            .is_err()
        );
    }

    #[test]
    fn undo_edit_restores_the_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "original").unwrap();
        let facade = facade_with_root(dir.path());

        edit(
            &facade,
            json!({ "command": "str_replace", "path": "a.txt", "old_str": "original", "new_str": "edited" }),
        )
        .unwrap();
        edit(&facade, json!({ "command": "undo_edit", "path": "a.txt" })).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "original"
        );

        // History is consumed; a second undo has nothing to restore.
        assert!(edit(&facade, json!({ "command": "undo_edit", "path": "a.txt" })).is_err());
    }

    #[test]
    fn rejects_traversal_and_unknown_commands() {
        let dir = tempfile::tempdir().unwrap();
        let facade = facade_with_root(dir.path());

        for bad in ["../secret", "/etc/passwd"] {
            assert!(edit(&facade, json!({ "command": "view", "path": bad })).is_err());
        }
        assert!(edit(&facade, json!({ "command": "rename", "path": "a.txt" })).is_err());
    }

    #[test]
    fn missing_file_surfaces_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let facade = facade_with_root(dir.path());
        let err = edit(&facade, json!({ "command": "view", "path": "absent.txt" })).unwrap_err();
        assert!(matches!(err, PlugboardError::Io(_)));
    }
}
