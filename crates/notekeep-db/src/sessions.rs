//! Session and login-state repository implementation.
//!
//! Only SHA-256 hashes of session tokens are stored; the raw token lives in
//! the client's cookie.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

use notekeep_core::defaults::SESSION_TOKEN_LEN;
use notekeep_core::{Error, Result, SessionRepository};

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

/// Generate a cryptographically secure random alphanumeric string.
pub(crate) fn generate_secret(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hash a secret using SHA256.
pub(crate) fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Delete expired sessions and login states. Returns the number of rows
    /// removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let sessions = sqlx::query("DELETE FROM user_session WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        let states = sqlx::query("DELETE FROM login_state WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        info!(
            subsystem = "db",
            component = "sessions",
            op = "purge_expired",
            sessions,
            login_states = states,
            "Purged expired sessions"
        );
        Ok(sessions + states)
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, user_id: &str, ttl: Duration) -> Result<String> {
        let token = generate_secret(SESSION_TOKEN_LEN);
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO user_session (token_hash, user_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(hash_secret(&token))
        .bind(user_id)
        .bind(now)
        .bind(now + ttl)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "sessions",
            op = "create",
            user_id,
            "Created session"
        );
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<String>> {
        if token.is_empty() {
            return Ok(None);
        }
        sqlx::query_scalar(
            "SELECT user_id FROM user_session WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(hash_secret(token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_session WHERE token_hash = $1")
            .bind(hash_secret(token))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn create_login_state(
        &self,
        state: &str,
        pkce_verifier: &str,
        ttl: Duration,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO login_state (state, pkce_verifier, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(state)
        .bind(pkce_verifier)
        .bind(Utc::now() + ttl)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn consume_login_state(&self, state: &str) -> Result<Option<String>> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            "DELETE FROM login_state WHERE state = $1 RETURNING pkce_verifier, expires_at",
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(verifier, _)| verifier))
    }
}
