/// Data models for blog-service
///
/// Read models (`Post`, `Comment`) carry the author's username and the group
/// slug so listings can be rendered without extra lookups.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod forms;

pub use forms::{CommentForm, GroupForm, LoginForm, PostForm, SignupForm};

pub type UserId = i64;
pub type GroupId = i64;
pub type PostId = i64;

/// Registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user used in page contexts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        let full_name = format!("{} {}", user.first_name, user.last_name)
            .trim()
            .to_string();
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name,
        }
    }
}

/// Named category posts can be filed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub author_username: String,
    pub text: String,
    pub group_id: Option<GroupId>,
    pub group_slug: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: PostId,
    pub author_id: UserId,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// (user, author) subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: UserId,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Validated post content, shared by create and edit.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(GroupId),
    Author(UserId),
    /// Posts by every author the given user follows.
    FollowedBy(UserId),
}
