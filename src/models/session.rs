use sqlx::FromRow;

use super::user::UserId;

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub session_id: String,
    pub user_id: UserId,
    /// Absolute expiry in seconds since the Unix epoch.
    pub expires_at: i64,
}

impl Session {
    /// A session stays valid through the second it expires in.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
