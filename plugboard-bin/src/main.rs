use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use plugboard_config::ConfigStore;
use plugboard_server::Server;

/// Plugboard, a plug-and-play extension host
#[derive(Parser)]
#[command(name = "plugboard", version, about, long_about = None)]
struct Cli {
    /// Server name (defaults to server.name from configuration)
    #[arg(long)]
    name: Option<String>,

    /// Path to the configuration document
    #[arg(long, default_value = "config/config.json")]
    config: PathBuf,

    /// Transport to serve on (defaults to server.transport from configuration)
    #[arg(long, value_enum)]
    transport: Option<Transport>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

impl Transport {
    fn as_str(self) -> &'static str {
        match self {
            Transport::Stdio => "stdio",
            Transport::Http => "http",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = Arc::new(ConfigStore::load(&cli.config));
    let level = if cli.debug {
        "debug".to_string()
    } else {
        config.log_level()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    // Loading ran before the subscriber was installed, so its failure log
    // went nowhere; surface the fallback now that logging is live.
    if config.used_defaults() {
        tracing::warn!(
            path = %cli.config.display(),
            "configuration file missing or invalid, running on built-in defaults"
        );
    }

    let mut server = Server::new(
        cli.name,
        Arc::clone(&config),
        plugboard_plugins::builtin_catalog(),
    );
    server.load_all_plugins();

    let transport = cli.transport.map(|t| t.as_str().to_string());
    if let Err(e) = server.run(transport).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
