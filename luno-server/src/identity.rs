//! Accounts, credentials and token verification.

use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use luno_types::User;

use crate::clock::MonotonicClock;
use crate::db::repositories::UserRepository;
use crate::db::{Database, InsertOutcome};
use crate::error::{SocialError, SocialResult};
use crate::session::SessionManager;

/// The identity bound to a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
}

/// What the core needs from whoever owns user credentials
pub trait IdentityStore: Send + Sync {
    fn verify_token(&self, token: &str) -> SocialResult<Identity>;

    fn resolve_user(&self, user_id: &Uuid) -> SocialResult<User>;
}

#[derive(Clone)]
pub struct AccountService {
    db: Database,
    sessions: SessionManager,
    clock: Arc<MonotonicClock>,
}

impl AccountService {
    pub fn new(db: Database, sessions: SessionManager, clock: Arc<MonotonicClock>) -> Self {
        Self { db, sessions, clock }
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.db.pool.clone())
    }

    /// Create an account and open a session for it
    pub fn register(&self, username: &str, password: &str) -> SocialResult<(User, String)> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(SocialError::validation("username & password required"));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            avatar: String::new(),
            created_at: self.clock.now(),
        };
        let password_hash = hash_password(password)?;

        match self.users().create(&user, &password_hash)? {
            InsertOutcome::Inserted => {}
            InsertOutcome::AlreadyPresent | InsertOutcome::MissingReference => {
                return Err(SocialError::validation("Username taken"));
            }
        }

        let token = self.sessions.create_session(user.id)?;
        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok((user, token))
    }

    /// Check credentials and open a new session
    pub fn login(&self, username: &str, password: &str) -> SocialResult<(User, String)> {
        let (user, password_hash) = self
            .users()
            .get_credentials(username.trim())?
            .ok_or_else(|| SocialError::validation("Invalid credentials"))?;

        if !verify_password(password, &password_hash)? {
            tracing::debug!(username = %user.username, "Rejected login with wrong password");
            return Err(SocialError::validation("Invalid credentials"));
        }

        let token = self.sessions.create_session(user.id)?;
        Ok((user, token))
    }

    pub fn logout(&self, token: &str) -> SocialResult<()> {
        self.sessions.delete_session(token)?;
        Ok(())
    }

    /// Point the user's avatar at a stored media reference
    pub fn set_avatar(&self, user_id: &Uuid, avatar: &str) -> SocialResult<()> {
        if !self.users().update_avatar(user_id, avatar)? {
            return Err(SocialError::not_found("User"));
        }
        Ok(())
    }
}

impl IdentityStore for AccountService {
    fn verify_token(&self, token: &str) -> SocialResult<Identity> {
        if token.is_empty() {
            return Err(SocialError::auth("No token"));
        }

        // Unknown and expired tokens are auth failures; storage errors pass through
        let user_id = self
            .sessions
            .validate_session(token)?
            .ok_or_else(|| SocialError::auth("Invalid token"))?;

        let user = self
            .users()
            .get_by_id(&user_id)?
            .ok_or_else(|| SocialError::auth("Invalid token"))?;

        Ok(Identity {
            id: user.id,
            username: user.username,
        })
    }

    fn resolve_user(&self, user_id: &Uuid) -> SocialResult<User> {
        self.users()
            .get_by_id(user_id)?
            .ok_or_else(|| SocialError::not_found("User"))
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> SocialResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| SocialError::Storage(anyhow!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> SocialResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| SocialError::Storage(anyhow!("Invalid password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
