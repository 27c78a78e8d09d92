//! zana-dash - ingredient-analysis dashboard service
//!
//! Serves the dashboard JSON API over the Living Apps record store.
//! Settings come from the command line, `ZANA_*` environment variables and
//! the TOML config file, in that order of priority.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zana_common::config::{load_toml_config, resolve_config_path, TomlConfig};
use zana_dash::extract::{HttpPhotoExtractor, PhotoExtractor};
use zana_dash::store::{LivingAppsClient, MemoryStore, RecordStore};
use zana_dash::{build_router, AppState};

/// Command-line arguments for zana-dash
#[derive(Parser, Debug)]
#[command(name = "zana-dash")]
#[command(about = "Ingredient-analysis dashboard service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "ZANA_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the record store REST API
    #[arg(long, env = "ZANA_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Session cookie for the record store
    #[arg(long, env = "ZANA_SESSION_COOKIE", hide_env_values = true)]
    session_cookie: Option<String>,

    /// Photo extraction service endpoint
    #[arg(long, env = "ZANA_EXTRACTION_URL")]
    extraction_url: Option<String>,

    /// Address to listen on
    #[arg(short, long, env = "ZANA_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Serve from an empty in-memory store instead of the remote API
    #[arg(long)]
    demo: bool,
}

impl Args {
    /// Layer command line and environment over the TOML values
    fn apply(self, mut config: TomlConfig) -> TomlConfig {
        if let Some(url) = self.api_base_url {
            config.api_base_url = url;
        }
        if let Some(cookie) = self.session_cookie {
            config.session_cookie = Some(cookie);
        }
        if let Some(url) = self.extraction_url {
            config.extraction_url = Some(url);
        }
        if let Some(addr) = self.bind_address {
            config.bind_address = addr;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = load_toml_config(config_path.as_deref()).context("Failed to load configuration")?;
    let demo = args.demo;
    let config = args.apply(toml_config);
    config.validate().context("Invalid configuration")?;

    // RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting zana-dash v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Configuration: {}", path.display()),
        _ => info!("No configuration file, using defaults"),
    }

    let store: Arc<dyn RecordStore> = if demo {
        info!("Demo mode: records are kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        if config.session_cookie.is_none() {
            warn!("No session cookie configured; the record store will likely reject requests");
        }
        info!("Record store: {}", config.api_base_url);
        Arc::new(
            LivingAppsClient::new(&config.api_base_url, config.session_cookie.clone())
                .context("Failed to create record store client")?,
        )
    };

    let extractor: Option<Arc<dyn PhotoExtractor>> = match &config.extraction_url {
        Some(url) => {
            info!("Photo extraction: {}", url);
            Some(Arc::new(
                HttpPhotoExtractor::new(url).context("Failed to create extraction client")?,
            ))
        }
        None => {
            info!("Photo extraction not configured; photo scan disabled");
            None
        }
    };

    let bind_address = config.bind_address.clone();
    let app = build_router(AppState::new(store, extractor, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("zana-dash listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
