use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

/// Lifetime of a session when none is configured
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Database-backed session manager for persistent authentication
///
/// Manages user sessions with token-based authentication, including:
/// - Session creation with UUID v4 tokens
/// - Session validation with expiry checking
/// - Session deletion (logout)
/// - Cleanup of expired sessions
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager with the default lifetime
    pub fn new(db: Database) -> Self {
        Self::with_ttl(db, Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    pub fn with_ttl(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Create a new session for a user
    ///
    /// # Returns
    /// * `Result<String>` - The session token on success
    pub fn create_session(&self, user_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + self.ttl;

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                user_id.to_string(),
                created_at.timestamp_millis(),
                expires_at.timestamp_millis(),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token and return the associated user ID
    ///
    /// # Returns
    /// * `Ok(None)` - If the session is unknown or expired
    /// * `Err` - If the session store could not be read
    pub fn validate_session(&self, token: &str) -> Result<Option<Uuid>> {
        let conn = self.db.connection()?;

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to look up session")?;
        drop(conn);

        let Some((user_id_str, expires_at)) = row else {
            return Ok(None);
        };

        if Utc::now().timestamp_millis() > expires_at {
            // Clean up expired session
            self.delete_session(token)?;
            tracing::debug!("Rejected expired session");
            return Ok(None);
        }

        let user_id = Uuid::parse_str(&user_id_str).context("Failed to parse user ID")?;

        Ok(Some(user_id))
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Clean up expired sessions from the database
    ///
    /// # Returns
    /// * `Result<usize>` - The number of sessions deleted
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = Utc::now().timestamp_millis();

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}
