//! Narrow persistence interface shared by the credential and session services.
//!
//! Both services receive an `Arc<dyn AuthStore>` at construction, so the
//! SQLite backend can be swapped for [`memory::MemoryStore`] in tests.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        session::Session,
        user::{User, UserId},
    },
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Fails with [`AppError::DuplicateUsername`] when the name is taken.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserId, AppError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>, AppError>;

    /// Deleting a missing session is not an error.
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError>;

    /// Removes every session with `expires_at < now`, returning how many went.
    async fn delete_expired_sessions(&self, now: i64) -> Result<u64, AppError>;
}
