#![allow(dead_code)]

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use gatehouse::{
    clock::ManualClock,
    config::AppConfig,
    db::{init_memory_pool, init_pool, run_migrations},
    services::password::PasswordPolicy,
    state::AppState,
    store::SqliteStore,
};

pub const LOGIN_FLOOR: Duration = Duration::from_millis(250);
pub const SESSION_TTL: Duration = Duration::from_secs(300);

pub fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        static_dir: PathBuf::from("dist"),
        cookie_secret: "test-cookie-secret".into(),
        session_ttl: SESSION_TTL,
        login_floor: LOGIN_FLOOR,
        session_sweep_interval: None,
        shutdown_grace: Duration::from_secs(1),
        password: PasswordPolicy {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        },
    }
}

/// App state over an in-memory SQLite database.
pub async fn memory_state(clock: Arc<ManualClock>) -> anyhow::Result<AppState> {
    let pool = init_memory_pool().await?;
    run_migrations(&pool).await?;
    let store = Arc::new(SqliteStore::new(pool));
    Ok(AppState::new(
        test_config("sqlite::memory:".into()),
        store,
        clock,
    )?)
}

/// App state over a SQLite file, like the production binary uses.
pub async fn file_state(database_url: &str, clock: Arc<ManualClock>) -> anyhow::Result<AppState> {
    let pool = init_pool(database_url).await?;
    run_migrations(&pool).await?;
    let store = Arc::new(SqliteStore::new(pool));
    Ok(AppState::new(test_config(database_url.into()), store, clock)?)
}
