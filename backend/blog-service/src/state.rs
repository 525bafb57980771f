use std::sync::Arc;

use crate::cache::FeedCache;
use crate::db::EntityStore;
use crate::media::MediaStorage;
use crate::pagination::Paginator;
use crate::security::JwtKeys;
use crate::services::{CommentService, FollowService, GroupService, PostService, UserService};

/// Shared state handed to every handler through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub feed_cache: Arc<FeedCache>,
    pub jwt: Arc<JwtKeys>,
    pub media: Arc<MediaStorage>,
    pub paginator: Paginator,
    /// Admin routes answer 404 while this is unset.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn posts(&self) -> PostService {
        PostService::with_cache(self.store.clone(), self.feed_cache.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.store.clone())
    }

    pub fn follows(&self) -> FollowService {
        FollowService::new(self.store.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.store.clone())
    }

    pub fn groups(&self) -> GroupService {
        GroupService::new(self.store.clone())
    }
}
