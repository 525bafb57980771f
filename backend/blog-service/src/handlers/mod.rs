/// HTTP handlers for blog-service
///
/// Pages are JSON documents carrying the same context a rendered page would:
/// listings return a `page_obj`, form endpoints answer GET with a description
/// of their fields. Successful writes redirect like a browser form post.
pub mod admin;
pub mod auth;
pub mod comments;
pub mod health;
pub mod media;
pub mod posts;
pub mod profile;

use actix_web::{http::header, HttpResponse};
use serde::Deserialize;

use crate::models::PostId;

pub use admin::create_group;
pub use auth::{login, login_form, signup, signup_form};
pub use comments::{add_comment, comment_form};
pub use health::{health, metrics, not_found, ready};
pub use media::media_file;
pub use posts::{
    create_post, create_post_form, create_post_upload, edit_post, edit_post_form,
    edit_post_upload, group_posts, index, is_multipart, post_detail,
};
pub use profile::{follow_index, profile, profile_follow, profile_unfollow};

/// `?page=` as sent by the client; parsing is lenient.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn post_url(post_id: PostId) -> String {
    format!("/posts/{}/", post_id)
}
