//! Cachelab Node - HTTP caching lab origin server.

use anyhow::Context;
use cachelab_core::CachingResourceService;
use cachelab_node::api::{create_router, AppState};
use cachelab_node::config::NodeConfig;
use cachelab_node::health::HealthState;
use cachelab_node::observability::{init_logging, LogFormat};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Cachelab Node - serves a versioned resource under HTTP caching disciplines
#[derive(Parser, Debug)]
#[command(name = "cachelab-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "CACHELAB_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// API listen address
    #[arg(long)]
    api_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,

    /// TTL for the max-age routes, in seconds
    #[arg(long)]
    max_age: Option<u64>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(addr) = self.api_addr {
            config.api_addr = addr;
        }
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.log_format = LogFormat::parse(format);
        }
        if let Some(max_age) = self.max_age {
            config.max_age_seconds = max_age;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let required = args.config != PathBuf::from("config.yaml");
    let mut config = NodeConfig::load(&args.config, required)
        .with_context(|| format!("loading {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    init_logging(&config.log_level, config.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Cachelab node");
    tracing::info!(
        api_addr = %config.api_addr,
        max_age_seconds = config.max_age_seconds,
        last_modified_granularity_secs = config.last_modified_granularity_secs,
        "Node configuration"
    );

    let service = Arc::new(CachingResourceService::new(config.service_config()));
    let state = AppState {
        cors_allow_any: config.cors_allow_any,
        ..AppState::new(service, config.max_age_seconds)
    };
    let health = state.health.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.api_addr)
        .await
        .with_context(|| format!("binding {}", config.api_addr))?;
    health.set_ready(true);
    tracing::info!(addr = %config.api_addr, "Node is ready. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(health))
        .await
        .context("server error")?;

    tracing::info!("Cachelab node stopped");
    Ok(())
}

async fn shutdown_signal(health: HealthState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    health.set_ready(false);
    tracing::info!("Shutting down, readiness cleared");
}
