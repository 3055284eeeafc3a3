use anyhow::{Context, Result};
use uuid::Uuid;

use luno_types::Post;

use crate::db::{insert_if_absent, DbPool, InsertOutcome};

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post. `MissingReference` means the author does not exist.
    pub fn create(&self, post: &Post) -> Result<InsertOutcome> {
        let conn = self.pool.get()?;
        insert_if_absent(
            &conn,
            "INSERT INTO posts (id, author_id, caption, media_type, media_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                post.id.to_string(),
                post.author_id.to_string(),
                &post.caption,
                post.media_type.as_str(),
                &post.media_url,
                post.created_at.timestamp_millis(),
            ),
        )
        .context("Failed to create post")
    }

    /// Get post count for a user
    pub fn get_post_count(&self, author_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE author_id = ?",
            [author_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::{Duration, Utc};
    use luno_types::MediaType;

    fn setup() -> (Database, PostRepository, Uuid) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let author = Uuid::new_v4();
        db.connection()
            .unwrap()
            .execute(
                "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, 'alice', 'x', 0)",
                [author.to_string()],
            )
            .unwrap();
        let repo = PostRepository::new(db.pool.clone());
        (db, repo, author)
    }

    fn post(author: Uuid, caption: &str, offset_ms: i64) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: author,
            caption: caption.to_string(),
            media_type: MediaType::Video,
            media_url: "/uploads/clip.mp4".to_string(),
            created_at: Utc::now() + Duration::milliseconds(offset_ms),
        }
    }

    #[test]
    fn test_create_stores_row() {
        let (db, repo, author) = setup();
        let created = post(author, "hello", 0);

        assert_eq!(repo.create(&created).unwrap(), InsertOutcome::Inserted);

        let (caption, media_type, created_at): (String, String, i64) = db
            .connection()
            .unwrap()
            .query_row(
                "SELECT caption, media_type, created_at FROM posts WHERE id = ?",
                [created.id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(caption, "hello");
        assert_eq!(media_type, MediaType::Video.as_str());
        assert_eq!(created_at, created.created_at.timestamp_millis());
    }

    #[test]
    fn test_post_count_per_author() {
        let (_db, repo, author) = setup();
        assert_eq!(repo.get_post_count(&author).unwrap(), 0);

        repo.create(&post(author, "first", 0)).unwrap();
        repo.create(&post(author, "second", 10)).unwrap();
        assert_eq!(repo.get_post_count(&author).unwrap(), 2);
        assert_eq!(repo.get_post_count(&Uuid::new_v4()).unwrap(), 0);
    }

    #[test]
    fn test_unknown_author() {
        let (_db, repo, _) = setup();
        assert_eq!(
            repo.create(&post(Uuid::new_v4(), "orphan", 0)).unwrap(),
            InsertOutcome::MissingReference
        );
    }
}
