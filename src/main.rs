//! Link Proxy
//!
//! Turns a file-sharing link into a direct download, served either as a
//! redirect or as a streamed relay with browser-friendly headers.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────────┐
//!                  │                       LINK PROXY                         │
//!                  │                                                          │
//!  GET /?url=...   │  ┌──────────┐   ┌──────────┐   ┌──────────┐             │
//!  ────────────────┼─▶│   http   │──▶│ security │──▶│ resolver │──▶ Resolver │
//!                  │  │  server  │   │  source  │   │  client  │    API      │
//!                  │  └──────────┘   └──────────┘   └────┬─────┘             │
//!                  │                                     │ direct link       │
//!                  │                                     ▼                   │
//!  302 / bytes     │  ┌──────────┐   ┌──────────┐   ┌──────────┐             │
//!  ◀───────────────┼──│ response │◀──│ security │◀──│ delivery │◀── File host│
//!                  │  │          │   │ headers  │   │  stream  │             │
//!                  │  └──────────┘   └──────────┘   └──────────┘             │
//!                  │                                                          │
//!                  │  config · observability · resilience · lifecycle · relay │
//!                  └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use link_proxy::config::loader::load_config;
use link_proxy::config::watcher::ConfigWatcher;
use link_proxy::lifecycle::spawn_signal_handler;
use link_proxy::observability::{logging, metrics};
use link_proxy::{HttpServer, ProxyConfig, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "link-proxy", version, about = "Resolve share links and serve direct downloads")]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("link-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        resolver = %config.resolver.base_url,
        default_mode = config.delivery.default_mode.as_str(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server for events to keep flowing.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
