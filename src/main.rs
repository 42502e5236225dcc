use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fedi_timeline_mirror::auth::{run_cleanup_worker, CLEANUP_INTERVAL};
use fedi_timeline_mirror::config::Config;
use fedi_timeline_mirror::db::Database;
use fedi_timeline_mirror::mastodon::MastodonClient;
use fedi_timeline_mirror::sync::SyncEngine;
use fedi_timeline_mirror::web::{self, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting fedi-timeline-mirror");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        base_url = %config.base_url,
        scheme = config.instance_scheme.as_str(),
        page_delay_ms = u64::try_from(config.sync_page_delay.as_millis()).unwrap_or(u64::MAX),
        "Configuration loaded"
    );

    let db = Database::open(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let mastodon = MastodonClient::new(&config).context("Failed to build HTTP client")?;
    let sync = SyncEngine::with_database(
        Arc::new(mastodon.clone()),
        db.clone(),
        config.sync_page_delay,
    );

    let shutdown = CancellationToken::new();

    let cleanup_handle = tokio::spawn(run_cleanup_worker(
        db.pool().clone(),
        CLEANUP_INTERVAL,
        shutdown.clone(),
    ));

    let state = AppState {
        db: db.clone(),
        config: Arc::new(config),
        mastodon,
        sync: Arc::new(sync),
    };
    let web_shutdown = shutdown.clone();
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(state, web_shutdown).await {
            error!("Web server error: {e:#}");
        }
    });

    shutdown_signal().await;

    info!("Shutting down...");
    shutdown.cancel();

    let _ = cleanup_handle.await;
    let _ = web_handle.await;
    db.close().await;

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fedi_timeline_mirror=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
