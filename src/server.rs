use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::app::{router, AppState};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgMovieStore, PgUserStore};

/// Build state, serve until a shutdown signal, then drain and release resources.
pub async fn run(config: AppConfig, in_memory: bool) -> anyhow::Result<()> {
    let database = if in_memory {
        warn!("using in-memory storage; data will not survive a restart");
        None
    } else {
        let manager = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        if config.database.run_migrations {
            manager.migrate().await.context("failed to run migrations")?;
        }
        Some(manager)
    };

    let state = match &database {
        Some(manager) => {
            let timeout = config.database.query_timeout();
            AppState::new(
                config.clone(),
                Arc::new(PgMovieStore::new(manager.pool(), timeout)),
                Arc::new(PgUserStore::new(manager.pool(), timeout)),
            )?
        }
        None => AppState::in_memory(config.clone())?,
    };

    let sweeper = state.limiter.start_sweeper();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, environment = config.environment.as_str(), "starting server");

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    let result = serve(listener, state, grace).await;

    sweeper.stop().await;
    if let Some(manager) = database {
        manager.close().await;
    }
    info!("server stopped");
    result
}

/// Serve `state` on `listener` until Ctrl-C/SIGTERM. In-flight requests get `grace` to finish.
pub async fn serve(listener: TcpListener, state: AppState, grace: Duration) -> anyhow::Result<()> {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = stop_rx.changed().await;
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => {
            joined.context("server task failed")??;
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, draining connections");
            let _ = stop_tx.send(true);
            match tokio::time::timeout(grace, &mut server).await {
                Ok(joined) => joined.context("server task failed")??,
                Err(_) => {
                    warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out");
                    server.abort();
                }
            }
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
