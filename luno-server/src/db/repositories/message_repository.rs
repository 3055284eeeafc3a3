use anyhow::{Context, Result};
use uuid::Uuid;

use luno_types::DirectMessage;

use crate::db::columns::{timestamp_at, uuid_at};
use crate::db::{insert_if_absent, DbPool, InsertOutcome};

pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist a direct message. `MissingReference` means sender or recipient does not exist.
    pub fn create(&self, message: &DirectMessage) -> Result<InsertOutcome> {
        let conn = self.pool.get()?;
        insert_if_absent(
            &conn,
            "INSERT INTO messages (id, from_id, to_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                message.id.to_string(),
                message.from.to_string(),
                message.to.to_string(),
                &message.content,
                message.created_at.timestamp_millis(),
            ),
        )
        .context("Failed to create direct message")
    }

    /// Get every message exchanged between two users, oldest first
    pub fn get_conversation(&self, user1_id: &Uuid, user2_id: &Uuid) -> Result<Vec<DirectMessage>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, from_id, to_id, content, created_at
             FROM messages
             WHERE (from_id = ?1 AND to_id = ?2) OR (from_id = ?2 AND to_id = ?1)
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let messages = stmt
            .query_map((user1_id.to_string(), user2_id.to_string()), |row| {
                Ok(DirectMessage {
                    id: uuid_at(row, 0)?,
                    from: uuid_at(row, 1)?,
                    to: uuid_at(row, 2)?,
                    content: row.get(3)?,
                    created_at: timestamp_at(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }
}
