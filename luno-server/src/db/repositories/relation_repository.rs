use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{insert_if_absent, DbPool, InsertOutcome};

pub struct RelationRepository {
    pool: DbPool,
}

impl RelationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if `follower_id` follows `followee_id`
    pub fn is_following(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM relations WHERE follower_id = ? AND followee_id = ?",
            (follower_id.to_string(), followee_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert the follow edge unless it already exists
    pub fn follow(
        &self,
        follower_id: &Uuid,
        followee_id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        let conn = self.pool.get()?;
        insert_if_absent(
            &conn,
            "INSERT OR IGNORE INTO relations (follower_id, followee_id, created_at) VALUES (?, ?, ?)",
            (follower_id.to_string(), followee_id.to_string(), at.timestamp_millis()),
        )
        .context("Failed to follow user")
    }

    /// Remove the follow edge. Returns the number of rows removed (0 or 1).
    pub fn unfollow(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM relations WHERE follower_id = ? AND followee_id = ?",
                (follower_id.to_string(), followee_id.to_string()),
            )
            .context("Failed to unfollow user")?;
        Ok(rows_affected)
    }

    /// Get follower count
    pub fn get_follower_count(&self, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM relations WHERE followee_id = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Get following count
    pub fn get_following_count(&self, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM relations WHERE follower_id = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
