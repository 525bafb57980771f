/// Profile pages and the follow relationship
use actix_web::{web, HttpResponse};
use serde::Serialize;

use super::{profile_url, redirect, PageQuery};
use crate::error::Result;
use crate::metrics::feed::LISTING_DURATION_SECONDS;
use crate::middleware::{AuthUser, MaybeUser};
use crate::models::{Author, Post};
use crate::pagination::{count, Page};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub author: Author,
    pub page_obj: Page<Post>,
    pub posts_count: usize,
    /// Whether the viewer follows this author; false for anonymous viewers.
    pub following: bool,
}

#[derive(Debug, Serialize)]
pub struct FollowPage {
    pub page_obj: Page<Post>,
}

/// GET /profile/{username}/
pub async fn profile(
    viewer: MaybeUser,
    state: web::Data<AppState>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let _timer = LISTING_DURATION_SECONDS
        .with_label_values(&["profile"])
        .start_timer();

    let author = state.users().get_by_username(&username).await?;
    let posts = state.posts().list_author_posts(author.id).await?;
    let posts_count = count(&posts);

    let following = match viewer.0 {
        Some(viewer) => state.follows().is_following(viewer.id, author.id).await?,
        None => false,
    };

    Ok(HttpResponse::Ok().json(ProfilePage {
        author: Author::from(&author),
        page_obj: state.paginator.get_page(posts, query.page.as_deref()),
        posts_count,
        following,
    }))
}

/// GET /profile/{username}/follow/ - following yourself or following twice
/// changes nothing.
pub async fn profile_follow(
    user: AuthUser,
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = state.users().get_by_username(&username).await?;
    state.follows().follow(user.id, author.id).await?;
    Ok(redirect(profile_url(&author.username)))
}

/// GET /profile/{username}/unfollow/ - 404 when not following.
pub async fn profile_unfollow(
    user: AuthUser,
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = state.users().get_by_username(&username).await?;
    state.follows().unfollow(user.id, author.id).await?;
    Ok(redirect(profile_url(&author.username)))
}

/// GET /follow/ - posts by followed authors, newest first.
pub async fn follow_index(
    user: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let _timer = LISTING_DURATION_SECONDS
        .with_label_values(&["follow"])
        .start_timer();

    let posts = state.follows().feed(user.id).await?;
    Ok(HttpResponse::Ok().json(FollowPage {
        page_obj: state.paginator.get_page(posts, query.page.as_deref()),
    }))
}
