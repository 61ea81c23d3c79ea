use std::sync::Arc;

use tracing::{debug, info, warn};

use super::password::PasswordPolicy;
use crate::{
    error::AppError,
    models::user::{User, UserId},
    store::AuthStore,
};

/// Verified against when the username is unknown, so both failure paths do
/// the same hashing work.
const DUMMY_PASSWORD: &str = "gatehouse-no-such-user";

#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn AuthStore>,
    policy: PasswordPolicy,
    dummy_hash: Arc<str>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn AuthStore>, policy: PasswordPolicy) -> Result<Self, AppError> {
        let dummy_hash = policy.hash_password(DUMMY_PASSWORD)?.into();
        Ok(Self {
            store,
            policy,
            dummy_hash,
        })
    }

    /// Surrounding whitespace is not part of a username; it is trimmed here
    /// and in `authenticate`.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserId, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("Username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AppError::BadRequest("Password must not be empty".into()));
        }

        let policy = self.policy;
        let password = password.to_owned();
        let hash = blocking(move || policy.hash_password(&password)).await?;

        match self.store.insert_user(username, &hash).await {
            Ok(id) => {
                info!(user_id = id, username, "registered user");
                Ok(id)
            }
            Err(AppError::DuplicateUsername) => {
                debug!(username, "registration rejected, name taken");
                Err(AppError::DuplicateUsername)
            }
            Err(err) => Err(err),
        }
    }

    /// Unknown user and wrong password produce the same error after the same
    /// amount of hashing.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserId, AppError> {
        let username = username.trim();
        let user = self.store.user_by_username(username).await?;
        let (user_id, hash) = match user {
            Some(user) => (Some(user.id), user.password_hash),
            None => (None, self.dummy_hash.to_string()),
        };

        let policy = self.policy;
        let password = password.to_owned();
        let matches = blocking(move || policy.verify_password(&password, &hash)).await?;

        match user_id {
            Some(id) if matches => {
                debug!(user_id = id, "credentials accepted");
                Ok(id)
            }
            _ => {
                warn!(username, "login rejected");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    pub async fn find_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        self.store.user_by_id(id).await
    }
}

async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(anyhow::Error::from)?
}
