use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use procura_core::config::{AppConfig, LoadOptions};
use procura_server::{app_router, bootstrap, logging::init_logging};
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging comes first so bootstrap events are visible.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config.logging);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        extraction_backend = app.extraction_backend,
        mail_transport = app.mail_transport,
        "procura-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let drain = shutdown.clone();
    let server = axum::serve(listener, app_router(app.state.clone(), app.db_pool.clone()))
        .with_graceful_shutdown(async move { drain.notified().await })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        () = wait_for_shutdown() => {
            tracing::info!(event_name = "system.server.stopping", "procura-server stopping");
            shutdown.notify_one();
            let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!(
                    event_name = "system.server.drain_timeout",
                    grace_secs = grace.as_secs(),
                    "in-flight requests did not finish before the shutdown deadline"
                ),
            }
        }
    }

    app.db_pool.close().await;
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_failed",
            error = %error,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
