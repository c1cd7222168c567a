use tracing::debug;

use plugboard_core::{PlugboardError, Result};
use plugboard_host::{Plugin, ServerFacade};

/// Sampling plugin: deterministic handler that echoes the prompt back as a
/// canned completion. Stands in for a client-backed sampler in tests and
/// offline runs.
///
/// `tool_configs.static_sampler.default_temperature` sets the temperature
/// reported when the request omits one.
pub struct StaticSamplerPlugin;

impl Plugin for StaticSamplerPlugin {
    fn setup(&mut self, facade: &mut ServerFacade) -> Result<()> {
        let default_temperature = facade
            .config()
            .tool_config("static_sampler")
            .get("default_temperature")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.7);

        facade.register_sampling(
            "static_sampler",
            "Deterministic echo sampler",
            move |request| {
                let prompt = request
                    .get("prompt")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        PlugboardError::plugin("static_sampler", "missing 'prompt' in request")
                    })?;
                let temperature = request
                    .get("temperature")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(default_temperature);
                debug!(temperature, "sampling request");

                Ok(format!("[static completion, t={temperature:.1}] {prompt}"))
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
        config.set(
            "tool_configs.static_sampler",
            json!({ "default_temperature": 0.2 }),
        );
        let mut facade = ServerFacade::new("test", config);
        StaticSamplerPlugin.setup(&mut facade).unwrap();
        facade
    }

    #[test]
    fn echoes_the_prompt_deterministically() {
        let f = facade();
        let out = f
            .sample("static_sampler", &json!({ "prompt": "hello" }))
            .unwrap();
        assert_eq!(out, "[static completion, t=0.2] hello");
    }

    #[test]
    fn request_temperature_wins_over_default() {
        let f = facade();
        let out = f
            .sample(
                "static_sampler",
                &json!({ "prompt": "p", "temperature": 0.9 }),
            )
            .unwrap();
        assert!(out.starts_with("[static completion, t=0.9]"));
    }

    #[test]
    fn prompt_is_required() {
        let f = facade();
        assert!(f.sample("static_sampler", &json!({})).is_err());
    }
}
