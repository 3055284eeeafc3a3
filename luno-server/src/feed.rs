//! Home feed: the viewer's own posts plus those of everyone they follow.

use anyhow::Context;
use rusqlite::TransactionBehavior;
use uuid::Uuid;

use luno_types::FeedItem;

use crate::db::columns::{media_type_at, timestamp_at, uuid_at};
use crate::db::DbPool;
use crate::error::SocialResult;

/// Maximum number of posts in one feed response
pub const FEED_LIMIT: usize = 100;

pub struct FeedComposer {
    pool: DbPool,
}

impl FeedComposer {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Newest-first feed for `viewer`, capped at [`FEED_LIMIT`].
    ///
    /// The followee set, the post selection and the like annotations are
    /// read in one transaction, so they all reflect the same snapshot.
    pub fn compose(&self, viewer: &Uuid) -> SocialResult<Vec<FeedItem>> {
        let mut conn = self.pool.get().context("Failed to get database connection from pool")?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .context("Failed to open feed snapshot")?;

        let items = {
            let mut stmt = tx.prepare(
                "WITH visible_authors(id) AS (
                    SELECT ?1
                    UNION
                    SELECT followee_id FROM relations WHERE follower_id = ?1
                 )
                 SELECT p.id, p.author_id, u.username, u.avatar, p.caption, p.media_type,
                        p.media_url, p.created_at,
                        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes,
                        EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1) AS liked
                 FROM posts p
                 JOIN users u ON u.id = p.author_id
                 WHERE p.author_id IN (SELECT id FROM visible_authors)
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT ?2",
            )?;

            let rows = stmt.query_map((viewer.to_string(), FEED_LIMIT as i64), |row| {
                Ok(FeedItem {
                    id: uuid_at(row, 0)?,
                    author_id: uuid_at(row, 1)?,
                    author_username: row.get(2)?,
                    author_avatar: row.get(3)?,
                    caption: row.get(4)?,
                    media_type: media_type_at(row, 5)?,
                    media_url: row.get(6)?,
                    created_at: timestamp_at(row, 7)?,
                    likes: row.get::<_, i64>(8)? as usize,
                    liked: row.get(9)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
                .context("Failed to read feed")?
        };

        tx.commit().context("Failed to close feed snapshot")?;
        tracing::debug!(viewer = %viewer, posts = items.len(), "Composed feed");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use crate::content::ContentStore;
    use crate::db::Database;
    use crate::graph::tests::seed_users;
    use crate::graph::SocialGraph;
    use luno_types::MediaType;
    use std::sync::Arc;

    struct Fixture {
        feed: FeedComposer,
        graph: SocialGraph,
        content: ContentStore,
        clock: Arc<MonotonicClock>,
        users: Vec<Uuid>,
    }

    fn setup() -> Fixture {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        let users = seed_users(&db, &["alice", "bob", "carol"]);
        let clock = Arc::new(MonotonicClock::new());
        Fixture {
            feed: FeedComposer::new(db.pool.clone()),
            graph: SocialGraph::new(db.pool.clone(), clock.clone()),
            content: ContentStore::new(db.pool, clock.clone()),
            clock,
            users,
        }
    }

    fn post(f: &Fixture, author: Uuid, caption: &str) -> Uuid {
        f.content
            .create_post(&author, caption, MediaType::Image, "/uploads/p.jpg")
            .unwrap()
            .id
    }

    #[test]
    fn test_own_posts_visible_without_follows() {
        let f = setup();
        let alice = f.users[0];
        let id = post(&f, alice, "mine");

        let feed = f.feed.compose(&alice).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, id);
        assert_eq!(feed[0].author_username, "alice");
        assert!(!feed[0].liked);
        assert_eq!(feed[0].likes, 0);
    }

    #[test]
    fn test_followed_posts_appear_only_while_following() {
        let f = setup();
        let (alice, bob) = (f.users[0], f.users[1]);
        post(&f, bob, "from bob");

        assert!(f.feed.compose(&alice).unwrap().is_empty());

        f.graph.follow(&alice, &bob).unwrap();
        let feed = f.feed.compose(&alice).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].author_id, bob);

        f.graph.unfollow(&alice, &bob).unwrap();
        assert!(f.feed.compose(&alice).unwrap().is_empty());
    }

    #[test]
    fn test_unfollowed_authors_excluded() {
        let f = setup();
        let (alice, bob, carol) = (f.users[0], f.users[1], f.users[2]);
        post(&f, carol, "carol's");
        post(&f, bob, "bob's");
        f.graph.follow(&alice, &bob).unwrap();

        let authors: Vec<_> = f.feed.compose(&alice).unwrap().into_iter().map(|p| p.author_id).collect();
        assert_eq!(authors, vec![bob]);
    }

    #[test]
    fn test_newest_first() {
        let f = setup();
        let alice = f.users[0];
        let base = chrono::Utc::now().timestamp_millis() + 60_000;

        f.clock.advance_to(base);
        let t1 = post(&f, alice, "t1");
        f.clock.advance_to(base + 10);
        let t2 = post(&f, alice, "t2");
        f.clock.advance_to(base + 20);
        let t3 = post(&f, alice, "t3");

        let ids: Vec<_> = f.feed.compose(&alice).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![t3, t2, t1]);
    }

    #[test]
    fn test_equal_timestamps_newest_insert_first() {
        let f = setup();
        let alice = f.users[0];
        f.clock.advance_to(chrono::Utc::now().timestamp_millis() + 60_000);

        let first = post(&f, alice, "a");
        let second = post(&f, alice, "b");

        let ids: Vec<_> = f.feed.compose(&alice).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_like_annotations_are_per_viewer() {
        let f = setup();
        let (alice, bob) = (f.users[0], f.users[1]);
        let id = post(&f, alice, "likeable");
        f.graph.follow(&bob, &alice).unwrap();

        f.content.like(&bob, &id).unwrap();

        let bobs = f.feed.compose(&bob).unwrap();
        assert_eq!(bobs[0].likes, 1);
        assert!(bobs[0].liked);

        let alices = f.feed.compose(&alice).unwrap();
        assert_eq!(alices[0].likes, 1);
        assert!(!alices[0].liked);
    }

    #[test]
    fn test_feed_likes_match_store_count() {
        let f = setup();
        let (alice, bob, carol) = (f.users[0], f.users[1], f.users[2]);
        let id = post(&f, alice, "popular");
        f.content.like(&alice, &id).unwrap();
        f.content.like(&bob, &id).unwrap();
        f.content.like(&carol, &id).unwrap();
        f.content.unlike(&carol, &id).unwrap();

        let feed = f.feed.compose(&alice).unwrap();
        let counted: usize = f.content.like_count(&id).unwrap();
        assert_eq!(feed[0].likes, counted);
        assert_eq!(counted, 2);
    }

    #[test]
    fn test_capped_at_limit() {
        let f = setup();
        let alice = f.users[0];
        for i in 0..(FEED_LIMIT + 5) {
            post(&f, alice, &format!("post {i}"));
        }

        let feed = f.feed.compose(&alice).unwrap();
        assert_eq!(feed.len(), FEED_LIMIT);
        assert_eq!(feed[0].caption, format!("post {}", FEED_LIMIT + 4));
    }
}
