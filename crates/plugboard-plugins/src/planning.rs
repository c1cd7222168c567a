use tracing::debug;

use plugboard_core::{PlugboardError, Result};
use plugboard_host::{Plugin, ServerFacade};

/// Prompt plugin: renders a task-planning prompt template.
///
/// Arguments: `task` (required), `steps` (default 5), `expertise_level`
/// (one of beginner/intermediate/professional/expert, default professional).
pub struct PlanningPlugin;

fn system_prompt(level: &str) -> &'static str {
    match level {
        "beginner" => {
            "You are a planning assistant for beginners, breaking complex tasks \
             into simple, easy-to-follow steps."
        }
        "intermediate" => {
            "You are an experienced planning assistant, breaking tasks into \
             clear, actionable steps."
        }
        "expert" => {
            "You are an expert-level planning assistant, producing precise, \
             in-depth steps with resource, risk, and alternative analysis."
        }
        _ => {
            "You are a professional planning assistant, breaking complex tasks \
             into efficient, optimized steps while accounting for risks."
        }
    }
}

impl Plugin for PlanningPlugin {
    fn setup(&mut self, facade: &mut ServerFacade) -> Result<()> {
        facade.register_prompt(
            "task_planning",
            "Generate a step-by-step plan for a task",
            |args| {
                let task = args
                    .get("task")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| PlugboardError::plugin("planning", "missing 'task' argument"))?;
                let steps = args.get("steps").and_then(|v| v.as_u64()).unwrap_or(5);
                let level = args
                    .get("expertise_level")
                    .and_then(|v| v.as_str())
                    .unwrap_or("professional");
                debug!(task, steps, level, "rendering task planning prompt");

                Ok(format!(
                    "{}\n\nCreate a detailed plan with {} steps for the following task:\n\n{}\n\n\
                     For each step give a goal, the actions to take, and a completion check.",
                    system_prompt(level),
                    steps,
                    task
                ))
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugboard_config::ConfigStore;
    use serde_json::json;
    use std::sync::Arc;

    fn facade() -> ServerFacade {
        let config = Arc::new(ConfigStore::load("/nonexistent/config.json"));
        let mut facade = ServerFacade::new("test", config);
        PlanningPlugin.setup(&mut facade).unwrap();
        facade
    }

    #[test]
    fn renders_with_defaults() {
        let f = facade();
        let out = f
            .render_prompt("task_planning", &json!({ "task": "ship the release" }))
            .unwrap();
        assert!(out.contains("ship the release"));
        assert!(out.contains("5 steps"));
        assert!(out.contains("professional planning assistant"));
    }

    #[test]
    fn honors_steps_and_level() {
        let f = facade();
        let out = f
            .render_prompt(
                "task_planning",
                &json!({ "task": "t", "steps": 3, "expertise_level": "expert" }),
            )
            .unwrap();
        assert!(out.contains("3 steps"));
        assert!(out.contains("expert-level"));
    }

    #[test]
    fn unknown_level_falls_back_to_professional() {
        let f = facade();
        let out = f
            .render_prompt(
                "task_planning",
                &json!({ "task": "t", "expertise_level": "wizard" }),
            )
            .unwrap();
        assert!(out.contains("professional planning assistant"));
    }

    #[test]
    fn task_is_required() {
        let f = facade();
        assert!(f.render_prompt("task_planning", &json!({})).is_err());
    }
}
