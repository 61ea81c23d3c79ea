use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::AuthStore;
use crate::{
    error::AppError,
    models::{
        session::Session,
        user::{User, UserId},
    },
};

/// In-process stand-in for the relational store, with the same uniqueness
/// and foreign-key rules.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    next_user_id: UserId,
    users: Vec<User>,
    sessions: HashMap<String, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserId, AppError> {
        let mut tables = self.inner.lock().await;
        if tables.users.iter().any(|user| user.username == username) {
            return Err(AppError::DuplicateUsername);
        }
        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.push(User {
            id,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
        });
        Ok(id)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.inner.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let tables = self.inner.lock().await;
        Ok(tables.users.iter().find(|user| user.id == id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        let mut tables = self.inner.lock().await;
        if !tables.users.iter().any(|user| user.id == session.user_id) {
            return Err(AppError::StoreUnavailable(format!(
                "user {} does not exist",
                session.user_id
            )));
        }
        if tables.sessions.contains_key(&session.session_id) {
            return Err(AppError::StoreUnavailable("session id already in use".into()));
        }
        tables
            .sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        Ok(self.inner.lock().await.sessions.get(session_id).cloned())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        self.inner.lock().await.sessions.remove(session_id);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: i64) -> Result<u64, AppError> {
        let mut tables = self.inner.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| session.expires_at >= now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_enforces_unique_usernames() {
        let store = MemoryStore::new();
        let first = store.insert_user("alice", "h1").await.unwrap();
        let second = store.insert_user("bob", "h2").await.unwrap();
        assert!(second > first);

        let err = store.insert_user("alice", "h3").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
        let alice = store.user_by_id(first).await.unwrap().unwrap();
        assert_eq!(alice.password_hash, "h1");
    }

    #[tokio::test]
    async fn test_memory_store_purges_only_expired() {
        let store = MemoryStore::new();
        let user_id = store.insert_user("alice", "h").await.unwrap();
        for (id, expires_at) in [("a", 10), ("b", 20)] {
            store
                .insert_session(&Session {
                    session_id: id.into(),
                    user_id,
                    expires_at,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.delete_expired_sessions(15).await.unwrap(), 1);
        assert_eq!(store.session_count().await, 1);
        assert!(store.session_by_id("b").await.unwrap().is_some());
    }
}
