//! Shared fixtures for the HTTP integration tests.
//!
//! Every test gets its own in-memory store, cache and signing key, so tests
//! never observe each other's data.
#![allow(dead_code)]

use actix_web::web;
use blog_service::cache::FeedCache;
use blog_service::db::{EntityStore, MemoryStore};
use blog_service::media::{MediaStorage, DEFAULT_MAX_UPLOAD_BYTES};
use blog_service::models::{Group, GroupId, NewGroup, NewUser, Post, PostDraft, User};
use blog_service::pagination::Paginator;
use blog_service::security::{hash_password, JwtKeys};
use blog_service::AppState;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const PAGE_SIZE: usize = 10;
pub const PASSWORD: &str = "correct-horse";
pub const ADMIN_TOKEN: &str = "admin-secret";

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryStore>,
    /// Media root for uploads; removed when the context drops.
    pub media_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_admin() -> Self {
        Self::build(Some(ADMIN_TOKEN.to_string()))
    }

    fn build(admin_token: Option<String>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let media_dir = TempDir::new().unwrap();
        let state = web::Data::new(AppState {
            store: store.clone(),
            feed_cache: Arc::new(FeedCache::new(Duration::from_secs(60))),
            jwt: Arc::new(JwtKeys::new("test-secret", 1)),
            media: Arc::new(MediaStorage::new(media_dir.path(), DEFAULT_MAX_UPLOAD_BYTES)),
            paginator: Paginator::new(PAGE_SIZE),
            admin_token,
        });
        Self {
            state,
            store,
            media_dir,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.store
            .create_user(NewUser {
                username: username.to_string(),
                first_name: "Test".to_string(),
                last_name: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: hash_password(PASSWORD).unwrap(),
            })
            .await
            .unwrap()
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: format!("Group {}", slug),
                slug: slug.to_string(),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    /// Insert straight into the store; the home page cache is not touched.
    pub async fn post(&self, author: &User, text: &str, group_id: Option<GroupId>) -> Post {
        self.store
            .insert_post(
                author.id,
                &PostDraft {
                    text: text.to_string(),
                    group_id,
                    image: None,
                },
            )
            .await
            .unwrap()
    }

    pub fn token(&self, user: &User) -> String {
        self.state.jwt.issue_token(user).unwrap()
    }

    pub fn auth_header(&self, user: &User) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token(user)))
    }
}
