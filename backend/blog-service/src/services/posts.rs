/// Post service - handles post listing, creation and editing
use crate::cache::FeedCache;
use crate::db::EntityStore;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::permissions::check_post_update;
use crate::models::{GroupId, Post, PostDraft, PostFilter, PostForm, PostId, UserId};
use std::sync::Arc;
use tracing::info;

pub struct PostService {
    store: Arc<dyn EntityStore>,
    cache: Option<Arc<FeedCache>>,
}

impl PostService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store, cache: None }
    }

    pub fn with_cache(store: Arc<dyn EntityStore>, cache: Arc<FeedCache>) -> Self {
        Self {
            store,
            cache: Some(cache),
        }
    }

    fn invalidate_home_page(&self) {
        if let Some(cache) = self.cache.as_ref() {
            cache.invalidate();
        }
    }

    /// All posts, or the posts of one group, newest first
    pub async fn list_posts(&self, group: Option<GroupId>) -> Result<Vec<Post>> {
        let filter = match group {
            Some(group_id) => PostFilter::Group(group_id),
            None => PostFilter::All,
        };
        self.store.list_posts(filter).await
    }

    pub async fn list_author_posts(&self, author_id: UserId) -> Result<Vec<Post>> {
        self.store.list_posts(PostFilter::Author(author_id)).await
    }

    pub async fn count_author_posts(&self, author_id: UserId) -> Result<usize> {
        self.store.count_posts(PostFilter::Author(author_id)).await
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: PostId) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }

    /// Create a new post
    pub async fn create_post(&self, author_id: UserId, form: &PostForm) -> Result<Post> {
        let draft = self.clean_form(form).await?;
        let post = self.store.insert_post(author_id, &draft).await?;

        info!(post_id = post.id, author_id, "post created");
        self.invalidate_home_page();
        Ok(post)
    }

    /// Only the author may edit. A rejected edit leaves the post untouched.
    /// Without a new image the current one is kept.
    pub async fn edit_post(
        &self,
        post_id: PostId,
        editor_id: UserId,
        form: &PostForm,
    ) -> Result<Post> {
        let post = self.get_post(post_id).await?;
        check_post_update(editor_id, &post)?;

        let mut draft = self.clean_form(form).await?;
        if draft.image.is_none() {
            draft.image = post.image;
        }
        let updated = self
            .store
            .update_post(post_id, &draft)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        info!(post_id, editor_id, "post edited");
        self.invalidate_home_page();
        Ok(updated)
    }

    /// Validate a submission, including that its group exists.
    pub async fn clean_form(&self, form: &PostForm) -> Result<PostDraft> {
        let draft = form.clean()?;
        if let Some(group_id) = draft.group_id {
            if self.store.find_group_by_id(group_id).await?.is_none() {
                let mut fields = FieldErrors::new();
                fields.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
                return Err(AppError::Validation(fields));
            }
        }
        Ok(draft)
    }
}
