use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use super::EntityStore;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, Group, GroupId, NewGroup, NewUser, Post, PostDraft, PostFilter, PostId, User, UserId,
};

const POST_COLUMNS: &str = r#"
    p.id, p.author_id, u.username AS author_username, p.text,
    p.group_id, g.slug AS group_slug, p.image, p.created_at
"#;

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, created_at";

/// Map a unique violation to `Conflict`, everything else to `Database`.
fn conflict_or(err: sqlx::Error, what: impl FnOnce() -> String) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(what())
        }
        _ => AppError::Database(err),
    }
}

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and bring the schema up to date.
    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(10))
            .test_before_acquire(true)
            .connect(url)
            .await?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))?;

        info!(max_connections, min_connections, "database pool ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn post_query(filter: PostFilter) -> String {
        let condition = match filter {
            PostFilter::All => "TRUE",
            PostFilter::Group(_) => "p.group_id = $1",
            PostFilter::Author(_) => "p.author_id = $1",
            PostFilter::FollowedBy(_) => {
                "p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = $1)"
            }
        };
        format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            WHERE {condition}
            ORDER BY p.created_at DESC, p.id DESC
            "#
        )
    }

    fn filter_arg(filter: PostFilter) -> Option<i64> {
        match filter {
            PostFilter::All => None,
            PostFilter::Group(id) | PostFilter::Author(id) | PostFilter::FollowedBy(id) => Some(id),
        }
    }
}

#[async_trait::async_trait]
impl EntityStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let username = user.username.clone();
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("username '{}' is already taken", username)))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let slug = group.slug.clone();
        sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("group slug '{}' is already taken", slug)))
    }

    async fn find_group_by_id(&self, id: GroupId) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn insert_post(&self, author_id: UserId, draft: &PostDraft) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (author_id, text, group_id, image)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            "#
        ))
        .bind(author_id)
        .bind(&draft.text)
        .bind(draft.group_id)
        .bind(&draft.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update_post(&self, post_id: PostId, draft: &PostDraft) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                UPDATE posts
                SET text = $1, group_id = $2, image = $3
                WHERE id = $4
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            "#
        ))
        .bind(&draft.text)
        .bind(draft.group_id)
        .bind(&draft.image)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post(&self, id: PostId) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN groups g ON g.id = p.group_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>> {
        let sql = Self::post_query(filter);
        let mut query = sqlx::query_as::<_, Post>(&sql);
        if let Some(arg) = Self::filter_arg(filter) {
            query = query.bind(arg);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM ({}) AS listing",
            Self::post_query(filter)
        );
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(arg) = Self::filter_arg(filter) {
            query = query.bind(arg);
        }

        let (count,) = query.fetch_one(&self.pool).await?;
        Ok(count as usize)
    }

    async fn insert_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH c AS (
                INSERT INTO comments (post_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
                   c.text, c.created_at
            FROM c
            JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(format!("post {}", post_id))
            }
            _ => AppError::Database(e),
        })?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author_username,
                   c.text, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn insert_follow_if_absent(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        let inserted = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn delete_follow(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE user_id = $1 AND author_id = $2
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn follow_exists(&self, user_id: UserId, author_id: UserId) -> Result<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
