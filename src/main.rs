//! Stream Processing Console
//!
//! A browser-facing gateway for a cloud stream-processing management API.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                  STREAM CONSOLE                       │
//!                         │                                                       │
//!   Browser JSON POST     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐       │
//!   ──────────────────────┼─▶│  http   │──▶│ payload  │──▶│   routing    │       │
//!                         │  │ server  │   │ decode   │   │ (resolve)    │       │
//!                         │  └─────────┘   └──────────┘   └──────┬───────┘       │
//!                         │                                      │ ResolvedCall  │
//!                         │                                      ▼               │
//!   Envelope (JSON)       │  ┌─────────┐   ┌──────────┐   ┌──────────────┐       │
//!   ◀─────────────────────┼──│response │◀──│normalize │◀──│   gateway    │◀──────┼── Management
//!                         │  └─────────┘   └──────────┘   │ digest auth  │       │   API
//!                         │                               └──────────────┘       │
//!                         │  config · observability · net::tls · lifecycle       │
//!                         └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use stream_console::config::{apply_env_overrides, load_config, validation::validate_config, ConfigError, ConsoleConfig};
use stream_console::http::ConsoleServer;
use stream_console::lifecycle::{wait_for_signal, Shutdown};
use stream_console::net::{load_tls_config, tls_files_present};
use stream_console::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "stream-console")]
#[command(about = "Web console gateway for stream-processing management", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ConsoleConfig::default(),
    };
    apply_env_overrides(&mut config);
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "stream-console starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_host = %config.upstream.default_host,
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = ConsoleServer::new(&config)?;
    let addr: SocketAddr = config.listener.bind_address.parse()?;

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    match &config.listener.tls {
        Some(tls) if tls_files_present(tls) => {
            let rustls = load_tls_config(tls).await?;
            server.run_tls(addr, rustls, shutdown.subscribe()).await?;
        }
        other => {
            if let Some(tls) = other {
                tracing::warn!(
                    cert_path = %tls.cert_path,
                    key_path = %tls.key_path,
                    "TLS certificate/key not found; serving plain HTTP"
                );
            }
            let listener = TcpListener::bind(addr).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
