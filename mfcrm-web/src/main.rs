//! mfcrm-web - Multifamily CRM web server
//!
//! Serves the CRM's HTML pages, form handlers and CSV/database exports
//! over a single SQLite database.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use mfcrm_common::config::{default_config_file, DatabaseResolver, TomlConfig};
use mfcrm_common::db::init_database;
use mfcrm_web::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mfcrm-web
#[derive(Parser, Debug)]
#[command(name = "mfcrm-web")]
#[command(about = "Multifamily real-estate CRM")]
#[command(version)]
struct Args {
    /// SQLite database URL or file path
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on (falls back to the config file, then 5001)
    #[arg(short, long, env = "MFCRM_PORT")]
    port: Option<u16>,
}

const DEFAULT_PORT: u16 = 5001;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mfcrm_web=info,mfcrm_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database work
    info!(
        "Starting mfcrm-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file_config = default_config_file()
        .as_deref()
        .map(TomlConfig::load)
        .unwrap_or_default();

    let database_url = DatabaseResolver::new(args.database_url.clone())
        .resolve()
        .context("Failed to resolve database location")?;
    info!("Database: {}", database_url);

    let pool = match init_database(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let app = build_router(AppState::new(pool));

    let port = args.port.or(file_config.port).unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", args.bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("mfcrm-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
