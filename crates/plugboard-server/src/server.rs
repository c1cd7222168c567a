use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use plugboard_config::ConfigStore;
use plugboard_core::Result;
use plugboard_host::watcher::POLL_INTERVAL;
use plugboard_host::{
    HotReloadWatcher, NotifySource, PluginCatalog, PluginChange, PluginLoader, PollingSource,
    ServerFacade,
};

/// The owning server: binds a facade and loader to the process configuration
/// and drives the serve loop.
///
/// All registry mutations happen on the task running [`Server::run`]; the
/// hot-reload watcher only sends messages.
pub struct Server {
    name: String,
    config: Arc<ConfigStore>,
    loader: PluginLoader,
}

impl Server {
    /// Build a server. `name` overrides `server.name` when given.
    pub fn new(name: Option<String>, config: Arc<ConfigStore>, catalog: PluginCatalog) -> Self {
        let name = name.unwrap_or_else(|| config.server_name());
        let facade = ServerFacade::new(&name, Arc::clone(&config));
        let loader = PluginLoader::new(facade, catalog, Arc::clone(&config));
        Self {
            name,
            config,
            loader,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut PluginLoader {
        &mut self.loader
    }

    /// Startup scan: load every discovered plugin of every kind.
    pub fn load_all_plugins(&mut self) {
        info!("loading plugins");
        self.loader.load_all();
        info!(count = self.loader.loaded().len(), "plugin loading complete");
    }

    /// Serve until a shutdown signal arrives. `transport` overrides
    /// `server.transport` when given; the wire loop itself is owned by the
    /// embedding facade, so this task parks on watcher messages and the
    /// signal handler.
    pub async fn run(&mut self, transport: Option<String>) -> Result<()> {
        let transport = transport.unwrap_or_else(|| self.config.transport());
        let (tools, resources, prompts, sampling) = self.loader.facade().surface();
        info!(
            server = %self.name,
            %transport,
            tools,
            resources,
            prompts,
            sampling,
            "server ready"
        );

        let mut changes = if self.config.hot_reload_enabled() {
            let (tx, rx) = mpsc::channel(64);
            self.spawn_watcher(tx, POLL_INTERVAL);
            Some(rx)
        } else {
            None
        };

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    break;
                }
                change = next_change(&mut changes) => match change {
                    Some(change) => self.loader.apply_change(&change),
                    None => {
                        warn!("hot reload channel closed");
                        changes = None;
                    }
                },
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Start the hot-reload watcher with the configured change-detection
    /// backend. A notify backend that cannot be constructed falls back to
    /// polling rather than running without hot reload.
    fn spawn_watcher(&self, tx: mpsc::Sender<PluginChange>, interval: std::time::Duration) {
        let backend = self.config.watch_backend();
        if backend == "notify" {
            match NotifySource::new() {
                Ok(source) => {
                    info!("hot reload using filesystem events");
                    HotReloadWatcher::spawn(Arc::clone(&self.config), source, tx, interval);
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "filesystem event watcher unavailable, falling back to polling");
                }
            }
        } else if backend != "poll" {
            warn!(%backend, "unknown watch backend, falling back to polling");
        }
        HotReloadWatcher::spawn(Arc::clone(&self.config), PollingSource::new(), tx, interval);
    }

    /// Unload every active plugin so teardowns run.
    pub fn shutdown(&mut self) {
        info!("cleaning up server resources");
        let mut ids: Vec<String> = self.loader.loaded().into_keys().collect();
        ids.sort();
        for id in ids {
            if let Err(e) = self.loader.unload(&id) {
                warn!(plugin = %id, error = %e, "unload during shutdown failed");
            }
        }
    }
}

/// Await the next watcher message, or pend forever when hot reload is off.
async fn next_change(rx: &mut Option<mpsc::Receiver<PluginChange>>) -> Option<PluginChange> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
