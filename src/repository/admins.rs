//! Administrator and session repository

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::{
    error::{map_unique_violation, AppError, AppResult},
    models::admin::{Admin, Session},
};

#[derive(Clone)]
pub struct AdminsRepository {
    pool: Pool<Sqlite>,
}

impl AdminsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get admin by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Admin> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin with id {} not found", id)))
    }

    /// Get admin by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    /// Create an admin with an already-hashed password
    pub async fn create(&self, username: &str, password_hash: &str) -> AppResult<Admin> {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (username, password_hash, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("Admin '{}' already exists", username)))
    }

    /// Count admins
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Record a new live session
    pub async fn create_session(&self, session: &Session) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_id, admin_id, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&session.token_id)
        .bind(session.admin_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a session by token id
    pub async fn get_session(&self, token_id: &str) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_id = ?1")
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    /// Revoke a session. Returns `false` if it was already gone.
    pub async fn delete_session(&self, token_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_id = ?1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop sessions that expired at or before `now`
    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64> {
        // Timestamps are RFC 3339 text; julianday compares them as instants
        let result =
            sqlx::query("DELETE FROM sessions WHERE julianday(expires_at) <= julianday(?1)")
                .bind(now)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
