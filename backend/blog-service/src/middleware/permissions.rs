/// Authorization module for blog-service
///
/// Ownership checks for content mutations. Only the author may edit a post.
use crate::error::{AppError, Result};
use crate::models::{Post, UserId};

/// Check if a user owns a post
pub fn check_post_ownership(user_id: UserId, post: &Post) -> Result<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user {} may not modify post {}",
            user_id, post.id
        )))
    }
}

/// Verify user has access to edit a post
pub fn check_post_update(user_id: UserId, post: &Post) -> Result<()> {
    check_post_ownership(user_id, post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_by(author_id: UserId) -> Post {
        Post {
            id: 1,
            author_id,
            author_username: "author".into(),
            text: "text".into(),
            group_id: None,
            group_slug: None,
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_author_may_edit() {
        assert!(check_post_update(5, &post_by(5)).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        assert!(matches!(
            check_post_update(6, &post_by(5)),
            Err(AppError::Forbidden(_))
        ));
    }
}
