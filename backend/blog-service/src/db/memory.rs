use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::EntityStore;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, Follow, Group, GroupId, NewGroup, NewUser, Post, PostDraft, PostFilter, PostId, User,
    UserId,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: HashMap<(UserId, UserId), Follow>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn group_slug(&self, id: Option<GroupId>) -> Option<String> {
        id.and_then(|id| self.groups.iter().find(|g| g.id == id))
            .map(|g| g.slug.clone())
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => {
                self.follows.contains_key(&(user_id, post.author_id))
            }
        }
    }
}

/// In-process store. All tables sit behind one lock, so every method is atomic
/// with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }

        let user = User {
            id: tables.next_id(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug '{}' is already taken",
                group.slug
            )));
        }

        let group = Group {
            id: tables.next_id(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group_by_id(&self, id: GroupId) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let mut groups = self.tables.read().await.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn insert_post(&self, author_id: UserId, draft: &PostDraft) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let author_username = tables
            .user(author_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| AppError::NotFound(format!("user {}", author_id)))?;
        let group_slug = tables.group_slug(draft.group_id);

        let post = Post {
            id: tables.next_id(),
            author_id,
            author_username,
            text: draft.text.clone(),
            group_id: draft.group_id,
            group_slug,
            image: draft.image.clone(),
            created_at: Utc::now(),
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: PostId, draft: &PostDraft) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let group_slug = tables.group_slug(draft.group_id);

        Ok(tables
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .map(|post| {
                post.text = draft.text.clone();
                post.group_id = draft.group_id;
                post.group_slug = group_slug;
                post.image = draft.image.clone();
                post.clone()
            }))
    }

    async fn find_post(&self, id: PostId) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, filter))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, filter))
            .count())
    }

    async fn insert_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }
        let author_username = tables
            .user(author_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| AppError::NotFound(format!("user {}", author_id)))?;

        let comment = Comment {
            id: tables.next_id(),
            post_id,
            author_id,
            author_username,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn insert_follow_if_absent(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.follows.contains_key(&(user_id, author_id)) {
            return Ok(false);
        }

        let follow = Follow {
            id: tables.next_id(),
            user_id,
            author_id,
            created_at: Utc::now(),
        };
        tables.follows.insert((user_id, author_id), follow);
        Ok(true)
    }

    async fn delete_follow(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.follows.remove(&(user_id, author_id)).is_some())
    }

    async fn follow_exists(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.follows.contains_key(&(user_id, author_id)))
    }
}
