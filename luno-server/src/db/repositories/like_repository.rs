use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{insert_if_absent, DbPool, InsertOutcome};

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a like unless the user already likes the post
    pub fn like(&self, user_id: &Uuid, post_id: &Uuid, at: DateTime<Utc>) -> Result<InsertOutcome> {
        let conn = self.pool.get()?;
        insert_if_absent(
            &conn,
            "INSERT OR IGNORE INTO likes (user_id, post_id, created_at) VALUES (?, ?, ?)",
            (user_id.to_string(), post_id.to_string(), at.timestamp_millis()),
        )
        .context("Failed to like post")
    }

    /// Delete a like. Returns the number of rows removed (0 or 1).
    pub fn unlike(&self, user_id: &Uuid, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM likes WHERE user_id = ? AND post_id = ?",
                (user_id.to_string(), post_id.to_string()),
            )
            .context("Failed to unlike post")?;
        Ok(rows)
    }

    pub fn like_count(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn has_liked(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let liked: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ? AND post_id = ?)",
            (user_id.to_string(), post_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(liked)
    }
}
