use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    clock::Clock,
    config::AppConfig,
    error::AppError,
    models::{session::Session, user::Credentials},
    services::{credentials::CredentialVerifier, sessions::SessionManager, timing::pad_to_floor},
    store::AuthStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub credentials: CredentialVerifier,
    pub sessions: SessionManager,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn AuthStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        let credentials = CredentialVerifier::new(store.clone(), config.password)?;
        let sessions = SessionManager::new(store, clock);
        Ok(Self {
            config,
            credentials,
            sessions,
            cookie_key,
        })
    }
}

impl AppState {
    /// Authenticates and opens a session. Every outcome, including input that
    /// failed to decode, takes at least `login_floor`.
    pub async fn login(
        &self,
        credentials: Result<Credentials, AppError>,
    ) -> Result<Session, AppError> {
        pad_to_floor(self.config.login_floor, async {
            let credentials = credentials?;
            let user_id = self
                .credentials
                .authenticate(&credentials.username, &credentials.password)
                .await?;
            self.sessions.issue(user_id, self.config.session_ttl).await
        })
        .await
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, path::PathBuf, time::Duration};

    use super::*;
    use crate::{clock::ManualClock, services::password::PasswordPolicy, store::MemoryStore};

    const FLOOR: Duration = Duration::from_millis(150);

    fn setup_state() -> AppState {
        let config = AppConfig {
            database_url: "sqlite::memory:".into(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            static_dir: PathBuf::from("dist"),
            cookie_secret: "state-test-secret".into(),
            session_ttl: Duration::from_secs(300),
            login_floor: FLOOR,
            session_sweep_interval: None,
            shutdown_grace: Duration::from_secs(1),
            password: PasswordPolicy {
                memory_kib: 64,
                iterations: 1,
                parallelism: 1,
            },
        };
        AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::default()),
        )
        .expect("state")
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_session_after_floor() {
        let state = setup_state();
        let user_id = state.credentials.register("alice", "secret123").await.unwrap();

        let started = std::time::Instant::now();
        let session = state
            .login(Ok(credentials("alice", "secret123")))
            .await
            .unwrap();

        assert!(started.elapsed() >= FLOOR);
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.expires_at, state.sessions.now() + 300);
    }

    #[tokio::test]
    async fn test_undecodable_login_is_padded() {
        let state = setup_state();

        let started = std::time::Instant::now();
        let err = state
            .login(Err(AppError::BadRequest("missing field".into())))
            .await
            .unwrap_err();

        assert!(started.elapsed() >= FLOOR);
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
