//! Follow relations between users.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::MonotonicClock;
use crate::db::repositories::RelationRepository;
use crate::db::{DbPool, InsertOutcome};
use crate::error::{SocialError, SocialResult};

pub struct SocialGraph {
    relations: RelationRepository,
    clock: Arc<MonotonicClock>,
}

impl SocialGraph {
    pub fn new(pool: DbPool, clock: Arc<MonotonicClock>) -> Self {
        Self {
            relations: RelationRepository::new(pool),
            clock,
        }
    }

    /// Make `viewer` follow `target`. Following someone already followed succeeds.
    pub fn follow(&self, viewer: &Uuid, target: &Uuid) -> SocialResult<()> {
        if viewer == target {
            return Err(SocialError::validation("Cannot follow yourself"));
        }

        match self.relations.follow(viewer, target, self.clock.now())? {
            InsertOutcome::Inserted => {
                tracing::debug!(follower = %viewer, followee = %target, "Follow edge created");
                Ok(())
            }
            InsertOutcome::AlreadyPresent => Ok(()),
            InsertOutcome::MissingReference => Err(SocialError::not_found("User")),
        }
    }

    /// Remove the edge if present; unfollowing someone not followed is a no-op.
    pub fn unfollow(&self, viewer: &Uuid, target: &Uuid) -> SocialResult<()> {
        if self.relations.unfollow(viewer, target)? > 0 {
            tracing::debug!(follower = %viewer, followee = %target, "Follow edge removed");
        }
        Ok(())
    }

    pub fn is_following(&self, a: &Uuid, b: &Uuid) -> SocialResult<bool> {
        Ok(self.relations.is_following(a, b)?)
    }

    pub fn follower_count(&self, user: &Uuid) -> SocialResult<usize> {
        Ok(self.relations.get_follower_count(user)?)
    }

    pub fn following_count(&self, user: &Uuid) -> SocialResult<usize> {
        Ok(self.relations.get_following_count(user)?)
    }
}
