use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use busline_fleet::{BroadcastNotifier, open_store};
use busline_hub::{AppState, HubConfig, ServeOutcome, create_router, serve_with_grace};
use clap::Parser;
use log::{error, info, warn};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about = "Bus fleet position hub")]
struct Cli {
    /// Directory holding `busline.json` and the default SQLite database.
    #[arg(long, default_value = ".busline")]
    config_dir: PathBuf,
    /// Listen address, overriding the config file.
    #[arg(long, env = "BUSLINE_BIND")]
    bind: Option<String>,
    /// PostgreSQL URL; switches the store away from SQLite.
    #[arg(long, env = "BUSLINE_DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = HubConfig::load_or_init(&cli.config_dir)
        .with_context(|| format!("load config from {}", cli.config_dir.display()))?;
    config.apply_overrides(cli.database_url, cli.bind);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.server.log_level()),
    )
    .init();

    info!(
        "hub: starting backend={} bind={}",
        config.fleet.backend_name(),
        config.server.bind()
    );

    let notifier = BroadcastNotifier::new(config.fleet.notify().capacity());
    let store = open_store(&config.fleet, &cli.config_dir, Arc::new(notifier.clone()))
        .await
        .context("open fleet store")?;

    let app = create_router(
        AppState::new(store.clone(), notifier),
        &config.server.cors_origins(),
    );
    let listener = TcpListener::bind(config.server.bind())
        .await
        .with_context(|| format!("bind {}", config.server.bind()))?;
    info!("hub: listening on {}", listener.local_addr()?);

    let outcome =
        serve_with_grace(listener, app, shutdown_signal(), config.server.shutdown_grace()).await;
    if outcome == ServeOutcome::Abandoned {
        warn!("hub: closing store with abandoned requests still attached");
    }

    if let Err(err) = store.close().await {
        error!("hub: closing store failed: {err}");
    }
    info!("hub: shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("hub: cannot listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("hub: cannot listen for SIGTERM: {err}");
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
}
