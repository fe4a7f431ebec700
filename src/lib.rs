pub mod config;
pub mod downloader;
pub mod logging;
pub mod retention;
pub mod server;
pub mod storage;

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;

use config::Config;
use downloader::backends::YtDlpEngine;
use downloader::Gateway;
use retention::SweepPolicy;
use storage::LocalStore;

/// Open storage, start the sweeper if it runs on a timer, and serve until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = LocalStore::open(&config.storage_dir)
        .await
        .with_context(|| format!("creating storage dir {}", config.storage_dir.display()))?;

    let engine = YtDlpEngine::new(
        config.launcher(),
        config.metadata_timeout(),
        config.download_timeout(),
    );
    tracing::info!(
        engine = %engine.launcher(),
        storage = %config.storage_dir.display(),
        "extraction engine ready"
    );

    let policy = config.sweep_policy();
    let gateway = Gateway::new(Arc::new(engine), Arc::new(store), policy);

    let sweeper_task = match policy {
        SweepPolicy::Interval(period) => {
            tracing::info!(period_secs = period.as_secs(), "periodic sweeping enabled");
            Some(gateway.sweeper().clone().spawn_periodic(period))
        }
        SweepPolicy::AfterDownload => None,
    };

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, server::router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(task) = sweeper_task {
        task.abort();
    }
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", error);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
