use std::{future::IntoFuture, sync::Arc};

use gatehouse::clock::SystemClock;
use gatehouse::config::AppConfig;
use gatehouse::db::{init_pool, run_migrations};
use gatehouse::error::AppError;
use gatehouse::routes::create_router;
use gatehouse::services::sweeper;
use gatehouse::state::AppState;
use gatehouse::store::SqliteStore;
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;

    if let Err(err) = run_migrations(&db).await {
        error!("migration failed: {err:?}");
        return Err(err);
    }

    let store = Arc::new(SqliteStore::new(db.clone()));
    let state = AppState::new(config.clone(), store, Arc::new(SystemClock))?;

    let sweep = config
        .session_sweep_interval
        .map(|every| sweeper::spawn(state.sessions.clone(), every));

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            stop_rx.await.ok();
        })
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        joined = &mut server => {
            joined.map_err(anyhow::Error::from)??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!("shutting down, waiting up to {:?} for requests", config.shutdown_grace);
    stop_tx.send(()).ok();
    if let Some(sweep) = sweep {
        sweep.abort();
    }

    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(joined) => joined.map_err(anyhow::Error::from)??,
        Err(_) => {
            warn!("grace period elapsed, dropping remaining connections");
            server.abort();
        }
    }

    db.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,gatehouse=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
