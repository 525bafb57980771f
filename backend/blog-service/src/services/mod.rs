/// Business logic layer for blog-service
///
/// Services hold an `Arc<dyn EntityStore>` and are cheap to build per request.
/// Handlers reach the store only through these; `/ready` is the exception and
/// calls `health_check` directly.
pub mod comments;
pub mod follow;
pub mod groups;
pub mod posts;
pub mod users;

pub use comments::CommentService;
pub use follow::FollowService;
pub use groups::GroupService;
pub use posts::PostService;
pub use users::UserService;
