use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use luno_types::User;

use crate::db::columns::{timestamp_at, uuid_at};
use crate::db::{insert_if_absent, DbPool, InsertOutcome};

pub struct UserRepository {
    pool: DbPool,
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        avatar: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Returns `AlreadyPresent` when the username is taken.
    pub fn create(&self, user: &User, password_hash: &str) -> Result<InsertOutcome> {
        let conn = self.pool.get()?;
        insert_if_absent(
            &conn,
            "INSERT OR IGNORE INTO users (id, username, password_hash, avatar, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                user.id.to_string(),
                &user.username,
                password_hash,
                &user.avatar,
                user.created_at.timestamp_millis(),
            ),
        )
        .context("Failed to create user")
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, username, avatar, created_at FROM users WHERE id = ?",
                [user_id.to_string()],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user together with their stored password hash
    pub fn get_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                "SELECT id, username, avatar, created_at, password_hash FROM users WHERE username = ?",
                [username],
                |row| Ok((map_user(row)?, row.get(4)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Replace the user's avatar reference. Returns false if the user does not exist.
    pub fn update_avatar(&self, user_id: &Uuid, avatar: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE users SET avatar = ? WHERE id = ?",
                [avatar, &user_id.to_string()],
            )
            .context("Failed to update user avatar")?;
        Ok(rows > 0)
    }
}
