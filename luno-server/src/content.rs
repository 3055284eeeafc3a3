//! Posts, likes and comments.

use std::sync::Arc;

use uuid::Uuid;

use luno_types::{Comment, CommentView, LikeState, MediaType, Post};

use crate::clock::MonotonicClock;
use crate::db::repositories::{CommentRepository, LikeRepository, PostRepository};
use crate::db::{DbPool, InsertOutcome};
use crate::error::{SocialError, SocialResult};

pub struct ContentStore {
    posts: PostRepository,
    likes: LikeRepository,
    comments: CommentRepository,
    clock: Arc<MonotonicClock>,
}

impl ContentStore {
    pub fn new(pool: DbPool, clock: Arc<MonotonicClock>) -> Self {
        Self {
            posts: PostRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            comments: CommentRepository::new(pool),
            clock,
        }
    }

    pub fn create_post(
        &self,
        author: &Uuid,
        caption: &str,
        media_type: MediaType,
        media_ref: &str,
    ) -> SocialResult<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: *author,
            caption: caption.to_string(),
            media_type,
            media_url: media_ref.to_string(),
            created_at: self.clock.now(),
        };

        match self.posts.create(&post)? {
            InsertOutcome::MissingReference => Err(SocialError::not_found("User")),
            _ => {
                tracing::info!(post_id = %post.id, author = %author, media_type = media_type.as_str(), "Created post");
                Ok(post)
            }
        }
    }

    /// Idempotent like; liking a post twice leaves one like.
    pub fn like(&self, user: &Uuid, post: &Uuid) -> SocialResult<()> {
        match self.likes.like(user, post, self.clock.now())? {
            InsertOutcome::MissingReference => Err(SocialError::not_found("Post")),
            InsertOutcome::Inserted | InsertOutcome::AlreadyPresent => Ok(()),
        }
    }

    /// Removing a like that does not exist is a no-op.
    pub fn unlike(&self, user: &Uuid, post: &Uuid) -> SocialResult<()> {
        self.likes.unlike(user, post)?;
        Ok(())
    }

    /// Drive the (user, post) like toward the requested state
    pub fn set_like(&self, user: &Uuid, post: &Uuid, want: LikeState) -> SocialResult<()> {
        match want {
            LikeState::Liked => self.like(user, post),
            LikeState::Unliked => self.unlike(user, post),
        }
    }

    pub fn like_count(&self, post: &Uuid) -> SocialResult<usize> {
        Ok(self.likes.like_count(post)?)
    }

    pub fn has_liked(&self, user: &Uuid, post: &Uuid) -> SocialResult<bool> {
        Ok(self.likes.has_liked(user, post)?)
    }

    /// Add a comment. Empty content is accepted.
    pub fn add_comment(&self, author: &Uuid, post: &Uuid, content: &str) -> SocialResult<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: *post,
            author_id: *author,
            content: content.to_string(),
            created_at: self.clock.now(),
        };

        match self.comments.create(&comment)? {
            InsertOutcome::MissingReference => Err(SocialError::not_found("Post")),
            _ => Ok(comment),
        }
    }

    /// Comments on a post, oldest first
    pub fn list_comments(&self, post: &Uuid) -> SocialResult<Vec<CommentView>> {
        Ok(self.comments.list_for_post(post)?)
    }

    pub fn post_count(&self, author: &Uuid) -> SocialResult<usize> {
        Ok(self.posts.get_post_count(author)?)
    }
}
