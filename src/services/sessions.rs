//! Server-side session lifecycle.
//!
//! A session is Active until the clock passes `expires_at` or it is revoked.
//! Expiry is absolute and never extended by use. Every `validate` is a fresh
//! store read, so a revoke is visible to all handlers immediately.

use std::{sync::Arc, time::Duration};

use tracing::debug;
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::AppError,
    models::{session::Session, user::UserId},
    store::AuthStore,
};

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AuthStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn AuthStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current time in epoch seconds, as stored in `expires_at`.
    pub fn now(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// Collisions are left to the randomness of UUID v4; there is no lookup
    /// before insert.
    pub async fn issue(&self, user_id: UserId, ttl: Duration) -> Result<Session, AppError> {
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: self.now().saturating_add(ttl_secs(ttl)),
        };
        self.store.insert_session(&session).await?;
        debug!(user_id, expires_at = session.expires_at, "issued session");
        Ok(session)
    }

    /// `None` for unknown and expired sessions alike. Expired rows are left
    /// for [`SessionManager::purge_expired`].
    pub async fn validate(&self, session_id: &str) -> Result<Option<UserId>, AppError> {
        let Some(session) = self.store.session_by_id(session_id).await? else {
            return Ok(None);
        };

        if session.is_expired_at(self.now()) {
            debug!(user_id = session.user_id, "session expired");
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    pub async fn revoke(&self, session_id: &str) -> Result<(), AppError> {
        self.store.delete_session(session_id).await?;
        debug!("session revoked");
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.store.delete_expired_sessions(self.now()).await
    }
}

// Whole seconds, rounded up, never zero.
fn ttl_secs(ttl: Duration) -> i64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    i64::try_from(secs.max(1)).unwrap_or(i64::MAX)
}
