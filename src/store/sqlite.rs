use async_trait::async_trait;

use super::AuthStore;
use crate::{
    db::DbPool,
    error::AppError,
    models::{
        session::Session,
        user::{User, UserId},
    },
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for SqliteStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserId, AppError> {
        let result = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateUsername)
            }
            Err(err) => Err(AppError::store(err)),
        }
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT id, username, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::store)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT id, username, password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::store)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query("INSERT INTO sessions (session_id, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&session.session_id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;
        Ok(())
    }

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, Session>(
            "SELECT session_id, user_id, expires_at FROM sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: i64) -> Result<u64, AppError> {
        let done = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_pool, run_migrations};

    async fn setup_store() -> SqliteStore {
        let pool = init_memory_pool().await.expect("memory pool");
        run_migrations(&pool).await.expect("migrations");
        SqliteStore::new(pool)
    }

    fn session(id: &str, user_id: UserId, expires_at: i64) -> Session {
        Session {
            session_id: id.into(),
            user_id,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_user() {
        let store = setup_store().await;
        let id = store.insert_user("alice", "hash").await.unwrap();

        let by_name = store.user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_name.password_hash, "hash");

        let by_id = store.user_by_id(id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(store.user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_keeps_original_hash() {
        let store = setup_store().await;
        store.insert_user("alice", "first").await.unwrap();

        let err = store.insert_user("alice", "second").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));

        let user = store.user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "first");
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let store = setup_store().await;
        store.insert_user("alice", "hash").await.unwrap();
        store.insert_user("Alice", "hash").await.unwrap();
    }

    #[tokio::test]
    async fn test_session_roundtrip_and_delete() {
        let store = setup_store().await;
        let user_id = store.insert_user("alice", "hash").await.unwrap();
        store.insert_session(&session("s1", user_id, 100)).await.unwrap();

        let found = store.session_by_id("s1").await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.expires_at, 100);

        store.delete_session("s1").await.unwrap();
        assert!(store.session_by_id("s1").await.unwrap().is_none());
        store.delete_session("s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_session_requires_existing_user() {
        let store = setup_store().await;
        let err = store.insert_session(&session("s1", 999, 100)).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let store = setup_store().await;
        let user_id = store.insert_user("alice", "hash").await.unwrap();
        store.insert_session(&session("old", user_id, 50)).await.unwrap();
        store.insert_session(&session("edge", user_id, 100)).await.unwrap();
        store.insert_session(&session("new", user_id, 200)).await.unwrap();

        assert_eq!(store.delete_expired_sessions(100).await.unwrap(), 1);
        assert!(store.session_by_id("old").await.unwrap().is_none());
        assert!(store.session_by_id("edge").await.unwrap().is_some());
        assert!(store.session_by_id("new").await.unwrap().is_some());
    }
}
