use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum length enforced when provisioning an admin password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Contents of the sealed session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub username: String,
    pub is_logged_in: bool,
    pub expires_at: i64,
}

impl SessionData {
    pub fn new(user_id: i64, username: &str, ttl_secs: i64) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            is_logged_in: true,
            expires_at: Utc::now().timestamp() + ttl_secs,
        }
    }

    pub fn is_valid_at(&self, now: i64) -> bool {
        self.is_logged_in && self.expires_at > now
    }
}
