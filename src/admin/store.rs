use super::types::AdminUser;
use chrono::Utc;
use sqlx::SqlitePool;

/// Admin accounts in the `admin_users` table.
#[derive(Debug, Clone)]
pub struct AdminStore {
    pool: SqlitePool,
}

impl AdminStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// Creates the account, or replaces the password of an existing one.
    pub async fn upsert(&self, username: &str, password_hash: &str) -> Result<AdminUser, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>(
            "INSERT INTO admin_users (username, password_hash, created_at) \
             VALUES (?, ?, ?) \
             ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash \
             RETURNING *",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(&self) -> Result<Vec<AdminUser>, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users ORDER BY username ASC")
            .fetch_all(&self.pool)
            .await
    }

    /// Returns whether an account was removed.
    pub async fn remove(&self, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admin_users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
