use anyhow::{Context, Result};
use uuid::Uuid;

use luno_types::{Comment, CommentView};

use crate::db::columns::{timestamp_at, uuid_at};
use crate::db::{insert_if_absent, DbPool, InsertOutcome};

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new comment. `MissingReference` means the post or author does not exist.
    pub fn create(&self, comment: &Comment) -> Result<InsertOutcome> {
        let conn = self.pool.get()?;
        insert_if_absent(
            &conn,
            "INSERT INTO comments (id, post_id, author_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                &comment.content,
                comment.created_at.timestamp_millis(),
            ),
        )
        .context("Failed to create comment")
    }

    /// Comments on a post with author details, oldest first.
    /// Equal timestamps keep insertion order.
    pub fn list_for_post(&self, post_id: &Uuid) -> Result<Vec<CommentView>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, u.username, u.avatar, c.content, c.created_at
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at ASC, c.rowid ASC",
        )?;

        let comments = stmt
            .query_map([post_id.to_string()], |row| {
                Ok(CommentView {
                    id: uuid_at(row, 0)?,
                    post_id: uuid_at(row, 1)?,
                    author_id: uuid_at(row, 2)?,
                    username: row.get(3)?,
                    avatar: row.get(4)?,
                    content: row.get(5)?,
                    created_at: timestamp_at(row, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }
}
