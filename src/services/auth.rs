//! Administrator authentication and session service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::admin::{Admin, AdminClaims, Session},
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Check credentials, open a session and return its bearer token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, Admin)> {
        let admin = self
            .repository
            .admins
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&admin.password_hash, password)? {
            tracing::warn!(username, "Login refused: bad password");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let now = Utc::now();
        let purged = self.repository.admins.purge_expired_sessions(now).await?;
        if purged > 0 {
            tracing::debug!(purged, "Expired sessions removed");
        }

        let expires_at = now + Duration::hours(self.config.jwt_expiration_hours as i64);
        let session = Session {
            token_id: Uuid::new_v4().to_string(),
            admin_id: admin.id,
            created_at: now,
            expires_at,
        };
        self.repository.admins.create_session(&session).await?;

        let claims = AdminClaims {
            sub: admin.username.clone(),
            admin_id: admin.id,
            jti: session.token_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(admin_id = admin.id, "Admin logged in");
        Ok((token, admin))
    }

    /// Decode a bearer token and make sure its session is still live
    pub async fn validate_token(&self, token: &str) -> AppResult<AdminClaims> {
        let claims = AdminClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let session = self
            .repository
            .admins
            .get_session(&claims.jti)
            .await?
            .ok_or_else(|| AppError::Authentication("Session has ended".to_string()))?;

        if session.expires_at <= Utc::now() || session.admin_id != claims.admin_id {
            return Err(AppError::Authentication("Session has ended".to_string()));
        }

        Ok(claims)
    }

    /// End the session a token belongs to
    pub async fn logout(&self, claims: &AdminClaims) -> AppResult<()> {
        self.repository.admins.delete_session(&claims.jti).await?;
        tracing::info!(admin_id = claims.admin_id, "Admin logged out");
        Ok(())
    }

    /// Get admin by ID
    pub async fn get_admin(&self, id: i64) -> AppResult<Admin> {
        self.repository.admins.get_by_id(id).await
    }

    /// Create an administrator account
    pub async fn create_admin(&self, username: &str, password: &str) -> AppResult<Admin> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        let hash = hash_password(password)?;
        self.repository.admins.create(username, &hash).await
    }

    /// Seed the configured administrator when no account exists yet
    pub async fn ensure_default_admin(&self) -> AppResult<Option<Admin>> {
        if self.repository.admins.count().await? > 0 {
            return Ok(None);
        }

        match (&self.config.admin_username, &self.config.admin_password) {
            (Some(username), Some(password)) => {
                let admin = self.create_admin(username, password).await?;
                tracing::info!(username = %admin.username, "Seeded default administrator");
                Ok(Some(admin))
            }
            _ => {
                tracing::warn!("No administrator exists and none is configured; nobody can log in");
                Ok(None)
            }
        }
    }

    /// Remove expired sessions
    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        self.repository.admins.purge_expired_sessions(Utc::now()).await
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
