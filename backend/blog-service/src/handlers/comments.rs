use actix_web::{web, HttpResponse};

use super::{post_url, redirect};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{CommentForm, PostId};
use crate::state::AppState;

/// GET /posts/{id}/comment/
pub async fn comment_form(
    _user: AuthUser,
    state: web::Data<AppState>,
    post_id: web::Path<PostId>,
) -> Result<HttpResponse> {
    let post = state.posts().get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "post_id": post.id,
        "form": CommentForm::fields(),
    })))
}

/// POST /posts/{id}/comment/ - redirects back to the post.
pub async fn add_comment(
    user: AuthUser,
    state: web::Data<AppState>,
    post_id: web::Path<PostId>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    state.comments().add_comment(post_id, user.id, &form).await?;
    Ok(redirect(post_url(post_id)))
}
