use serde::Deserialize;
use sqlx::FromRow;

pub type UserId = i64;

#[derive(Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

// The hash stays out of Debug output so it can't leak into logs.
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Username/password pair as submitted by the login and register forms.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
