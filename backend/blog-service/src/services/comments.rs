/// Comment service - comments attached to posts
use crate::db::EntityStore;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentForm, PostId, UserId};
use std::sync::Arc;
use tracing::debug;

pub struct CommentService {
    store: Arc<dyn EntityStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Append a comment to a post. Fails with `NotFound` before validating
    /// when the post does not exist.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        form: &CommentForm,
    ) -> Result<Comment> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }
        let text = form.clean()?;

        let comment = self.store.insert_comment(post_id, author_id, &text).await?;
        debug!(comment_id = comment.id, post_id, author_id, "comment added");
        Ok(comment)
    }

    /// Comments of a post, oldest first
    pub async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        self.store.list_comments(post_id).await
    }
}
