use std::path::Path;

use clap::Parser;
use tracing::info;

use dikast_server::api::{self, AppState};
use dikast_server::config::DikastConfig;

/// Dikast rule engine HTTP server.
#[derive(Parser, Debug)]
#[command(name = "dikast-server", about = "Standalone HTTP server for the Dikast rule engine")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "dikast.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber from RUST_LOG or default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let mut config: DikastConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(
            path = %cli.config,
            "config file not found, using defaults"
        );
        DikastConfig::default()
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let prefix = config.api.prefix.clone();

    let state = AppState::new(config);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, %prefix, "dikast server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("dikast server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
