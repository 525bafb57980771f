use crate::db::EntityStore;
use crate::error::{AppError, Result};
use crate::metrics::feed::FOLLOW_EVENTS;
use crate::models::{Post, PostFilter, UserId};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct FollowService {
    store: Arc<dyn EntityStore>,
}

impl FollowService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Idempotent follow; returns true if a new relationship was created.
    /// Following yourself is a no-op.
    pub async fn follow(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        if user_id == author_id {
            FOLLOW_EVENTS.with_label_values(&["ignored_self"]).inc();
            debug!(user_id, "self-follow ignored");
            return Ok(false);
        }

        let created = self
            .store
            .insert_follow_if_absent(user_id, author_id)
            .await?;
        if created {
            FOLLOW_EVENTS.with_label_values(&["created"]).inc();
            info!(user_id, author_id, "follow created");
        } else {
            FOLLOW_EVENTS.with_label_values(&["ignored_duplicate"]).inc();
        }
        Ok(created)
    }

    pub async fn unfollow(&self, user_id: UserId, author_id: UserId) -> Result<()> {
        if !self.store.delete_follow(user_id, author_id).await? {
            return Err(AppError::NotFound(format!(
                "follow {} -> {}",
                user_id, author_id
            )));
        }
        FOLLOW_EVENTS.with_label_values(&["removed"]).inc();
        info!(user_id, author_id, "follow removed");
        Ok(())
    }

    /// Posts by every author `user_id` follows, newest first
    pub async fn feed(&self, user_id: UserId) -> Result<Vec<Post>> {
        self.store.list_posts(PostFilter::FollowedBy(user_id)).await
    }

    pub async fn is_following(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        self.store.follow_exists(user_id, author_id).await
    }
}
