/// Entity store: persistence for users, groups, posts, comments and follows.
///
/// `PgStore` is the production backend, `MemoryStore` backs local runs
/// without `DATABASE_URL` and the test suite. Services only see the trait.
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::Result;
use crate::models::{
    Comment, Group, GroupId, NewGroup, NewUser, Post, PostDraft, PostFilter, PostId, User, UserId,
};

#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert a group. Fails with `Conflict` when the slug is taken.
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn find_group_by_id(&self, id: GroupId) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn insert_post(&self, author_id: UserId, draft: &PostDraft) -> Result<Post>;

    /// Overwrite text/group/image. Returns `None` when the post does not exist.
    async fn update_post(&self, post_id: PostId, draft: &PostDraft) -> Result<Option<Post>>;

    async fn find_post(&self, id: PostId) -> Result<Option<Post>>;

    /// Posts matching `filter`, newest first
    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<usize>;

    async fn insert_comment(&self, post_id: PostId, author_id: UserId, text: &str)
        -> Result<Comment>;

    /// Comments of a post in insertion order
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>>;

    /// Insert-or-ignore keyed by (user, author). Returns true if a row was created.
    async fn insert_follow_if_absent(&self, user_id: UserId, author_id: UserId) -> Result<bool>;

    /// Returns true if a row was removed.
    async fn delete_follow(&self, user_id: UserId, author_id: UserId) -> Result<bool>;

    async fn follow_exists(&self, user_id: UserId, author_id: UserId) -> Result<bool>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
