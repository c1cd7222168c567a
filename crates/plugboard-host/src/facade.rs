use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use plugboard_config::ConfigStore;
use plugboard_core::{PlugboardError, Result};

/// Handler for a registered tool: arguments in, structured result out.
pub type ToolHandler = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;
/// Handler for a registered resource: arguments in, text content out.
pub type ResourceHandler = Box<dyn Fn(&Value) -> Result<String> + Send + Sync>;
/// Handler for a registered prompt template: arguments in, rendered text out.
pub type PromptHandler = Box<dyn Fn(&Value) -> Result<String> + Send + Sync>;
/// Handler for a sampling request: request payload in, completion text out.
pub type SamplingHandler = Box<dyn Fn(&Value) -> Result<String> + Send + Sync>;

struct Registered<H> {
    description: String,
    handler: H,
}

/// The host object a plugin's `setup` receives.
///
/// Carries the registration surface for every plugin kind plus the resolved
/// configuration. Registering under an existing name replaces the previous
/// handler, which is what makes reload-without-teardown workable: the
/// incoming setup simply registers over the outgoing registrations.
pub struct ServerFacade {
    name: String,
    config: Arc<ConfigStore>,
    tools: HashMap<String, Registered<ToolHandler>>,
    resources: HashMap<String, Registered<ResourceHandler>>,
    prompts: HashMap<String, Registered<PromptHandler>>,
    sampling: HashMap<String, Registered<SamplingHandler>>,
}

impl ServerFacade {
    pub fn new(name: impl Into<String>, config: Arc<ConfigStore>) -> Self {
        Self {
            name: name.into(),
            config,
            tools: HashMap::new(),
            resources: HashMap::new(),
            prompts: HashMap::new(),
            sampling: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved configuration, for plugins reading their own settings.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    // ── Registration primitives (invoked by plugin code) ───────

    pub fn register_tool<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        debug!(tool = name, "tool registered");
        self.tools.insert(
            name.to_string(),
            Registered {
                description: description.to_string(),
                handler: Box::new(handler),
            },
        );
    }

    pub fn register_resource<F>(&mut self, uri: &str, description: &str, handler: F)
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        debug!(resource = uri, "resource registered");
        self.resources.insert(
            uri.to_string(),
            Registered {
                description: description.to_string(),
                handler: Box::new(handler),
            },
        );
    }

    pub fn register_prompt<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        debug!(prompt = name, "prompt registered");
        self.prompts.insert(
            name.to_string(),
            Registered {
                description: description.to_string(),
                handler: Box::new(handler),
            },
        );
    }

    pub fn register_sampling<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        debug!(sampler = name, "sampling handler registered");
        self.sampling.insert(
            name.to_string(),
            Registered {
                description: description.to_string(),
                handler: Box::new(handler),
            },
        );
    }

    pub fn remove_tool(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    pub fn remove_resource(&mut self, uri: &str) -> bool {
        self.resources.remove(uri).is_some()
    }

    pub fn remove_prompt(&mut self, name: &str) -> bool {
        self.prompts.remove(name).is_some()
    }

    pub fn remove_sampling(&mut self, name: &str) -> bool {
        self.sampling.remove(name).is_some()
    }

    // ── Invocation (used by the serving layer and tests) ───────

    pub fn call_tool(&self, name: &str, args: &Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| PlugboardError::plugin(name, "tool not registered"))?;
        (tool.handler)(args)
    }

    pub fn read_resource(&self, uri: &str, args: &Value) -> Result<String> {
        let resource = self
            .resources
            .get(uri)
            .ok_or_else(|| PlugboardError::plugin(uri, "resource not registered"))?;
        (resource.handler)(args)
    }

    pub fn render_prompt(&self, name: &str, args: &Value) -> Result<String> {
        let prompt = self
            .prompts
            .get(name)
            .ok_or_else(|| PlugboardError::plugin(name, "prompt not registered"))?;
        (prompt.handler)(args)
    }

    pub fn sample(&self, name: &str, request: &Value) -> Result<String> {
        let sampler = self
            .sampling
            .get(name)
            .ok_or_else(|| PlugboardError::plugin(name, "sampling handler not registered"))?;
        (sampler.handler)(request)
    }

    // ── Introspection ──────────────────────────────────────────

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn tool_description(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|t| t.description.as_str())
    }

    pub fn resource_uris(&self) -> Vec<String> {
        let mut uris: Vec<_> = self.resources.keys().cloned().collect();
        uris.sort();
        uris
    }

    pub fn prompt_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.prompts.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn sampling_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.sampling.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered capability counts as (tools, resources, prompts, sampling).
    pub fn surface(&self) -> (usize, usize, usize, usize) {
        (
            self.tools.len(),
            self.resources.len(),
            self.prompts.len(),
            self.sampling.len(),
        )
    }
}
