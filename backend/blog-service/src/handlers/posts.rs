/// Post handlers - home listing, group listing, detail, create and edit
///
/// Create and edit take either a JSON body or `multipart/form-data`; only
/// the multipart form can carry an image.
use actix_multipart::{Multipart, MultipartError};
use actix_web::guard::GuardContext;
use actix_web::http::header::{self, ContentType};
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::HttpResponse;
use futures::StreamExt;
use serde::Serialize;

use super::{post_url, profile_url, redirect, PageQuery};
use crate::error::{AppError, FieldErrors, Result};
use crate::media::{ImageUpload, MediaStorage};
use crate::metrics::feed::LISTING_DURATION_SECONDS;
use crate::middleware::{check_post_update, AuthUser};
use crate::models::forms::FieldSpec;
use crate::models::{Comment, CommentForm, Group, Post, PostForm, PostId};
use crate::pagination::{parse_page_number, Page};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    pub post: Post,
    /// Number of posts by the same author
    pub posts_count: usize,
    pub comments: Vec<Comment>,
    pub form: Vec<FieldSpec>,
}

#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub form: Vec<FieldSpec>,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
}

async fn render_index(state: &AppState, raw_page: Option<&str>) -> Result<Bytes> {
    let _timer = LISTING_DURATION_SECONDS
        .with_label_values(&["index"])
        .start_timer();

    let posts = state.posts().list_posts(None).await?;
    let page = IndexPage {
        page_obj: state.paginator.get_page(posts, raw_page),
    };
    Ok(Bytes::from(serde_json::to_vec(&page)?))
}

/// GET / - all posts, newest first. The first page is served from the
/// home page cache.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let raw_page = query.page.as_deref();

    let body = if parse_page_number(raw_page) <= 1 {
        state
            .feed_cache
            .get_or_compute(|| render_index(&state, raw_page))
            .await?
    } else {
        render_index(&state, raw_page).await?
    };

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let _timer = LISTING_DURATION_SECONDS
        .with_label_values(&["group"])
        .start_timer();

    let group = state.groups().get_by_slug(&slug).await?;
    let posts = state.posts().list_posts(Some(group.id)).await?;
    let page_obj = state.paginator.get_page(posts, query.page.as_deref());

    Ok(HttpResponse::Ok().json(GroupPage { group, page_obj }))
}

/// GET /posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<PostId>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let posts = state.posts();

    let post = posts.get_post(post_id).await?;
    let posts_count = posts.count_author_posts(post.author_id).await?;
    let comments = state.comments().list_comments(post_id).await?;

    Ok(HttpResponse::Ok().json(PostDetailPage {
        post,
        posts_count,
        comments,
        form: CommentForm::fields(),
    }))
}

/// GET /create/
pub async fn create_post_form(
    _user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(PostFormPage {
        form: PostForm::fields(),
        groups: state.groups().list_groups().await?,
        is_edit: false,
        post: None,
    }))
}

/// POST /create/ - redirects to the author's profile.
pub async fn create_post(
    user: AuthUser,
    state: web::Data<AppState>,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    state.posts().create_post(user.id, &form).await?;
    Ok(redirect(profile_url(&user.username)))
}

/// GET /posts/{id}/edit/ - non-authors are sent to their own profile.
pub async fn edit_post_form(
    user: AuthUser,
    state: web::Data<AppState>,
    post_id: web::Path<PostId>,
) -> Result<HttpResponse> {
    let post = state.posts().get_post(post_id.into_inner()).await?;
    if check_post_update(user.id, &post).is_err() {
        return Ok(redirect(profile_url(&user.username)));
    }

    Ok(HttpResponse::Ok().json(PostFormPage {
        form: PostForm::fields(),
        groups: state.groups().list_groups().await?,
        is_edit: true,
        post: Some(post),
    }))
}

/// POST /posts/{id}/edit/
pub async fn edit_post(
    user: AuthUser,
    state: web::Data<AppState>,
    post_id: web::Path<PostId>,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let result = state.posts().edit_post(post_id, user.id, &form).await;
    edit_response(&user, post_id, result)
}

fn edit_response(user: &AuthUser, post_id: PostId, result: Result<Post>) -> Result<HttpResponse> {
    match result {
        Ok(_) => Ok(redirect(post_url(post_id))),
        Err(AppError::Forbidden(reason)) => Ok(refuse_edit(user, post_id, &reason)),
        Err(err) => Err(err),
    }
}

fn refuse_edit(user: &AuthUser, post_id: PostId, reason: &str) -> HttpResponse {
    tracing::warn!(post_id, user_id = user.id, %reason, "edit by non-author refused");
    redirect(profile_url(&user.username))
}

// =====================================================================
// Multipart submissions
// =====================================================================

/// Upper bound for a non-file form field.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Route guard for `multipart/form-data` bodies.
pub fn is_multipart(ctx: &GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("multipart/form-data"))
}

fn malformed(err: MultipartError) -> AppError {
    let mut fields = FieldErrors::new();
    fields.add("non_field_errors", format!("Malformed form data: {}", err));
    AppError::Validation(fields)
}

/// Read a post submitted as `multipart/form-data`. The image is checked but
/// not written; every field error is reported at once.
async fn read_post_multipart(
    media: &MediaStorage,
    mut payload: Multipart,
) -> Result<(PostForm, Option<ImageUpload>)> {
    let mut form = PostForm::default();
    let mut image = None;
    let mut fields = FieldErrors::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let name = field.name().unwrap_or_default().to_string();
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some_and(|filename| !filename.is_empty());
        let limit = if name == "image" {
            media.max_upload_bytes()
        } else {
            MAX_TEXT_FIELD_BYTES
        };

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(malformed)?;
            if buf.len() + chunk.len() > limit {
                if name == "image" {
                    return Err(media.too_large());
                }
                let mut fields = FieldErrors::new();
                fields.add(name, "Ensure this value is shorter.");
                return Err(AppError::Validation(fields));
            }
            buf.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "text" => form.text = String::from_utf8_lossy(&buf).into_owned(),
            "group" => {
                let raw = String::from_utf8_lossy(&buf);
                let raw = raw.trim();
                if !raw.is_empty() {
                    match raw.parse() {
                        Ok(group_id) => form.group = Some(group_id),
                        Err(_) => fields.add("group", INVALID_GROUP),
                    }
                }
            }
            // An empty file input submits a part without a filename.
            "image" if is_file => match media.check_image(buf.freeze()) {
                Ok(upload) => image = Some(upload),
                Err(AppError::Validation(errors)) => fields.merge(errors),
                Err(err) => return Err(err),
            },
            _ => {}
        }
    }

    if let Err(err) = form.clean() {
        match err {
            AppError::Validation(errors) => fields.merge(errors),
            other => return Err(other),
        }
    }
    fields.into_result()?;
    Ok((form, image))
}

/// Validate the full submission, then write the image and record its key.
async fn attach_image(
    state: &AppState,
    mut form: PostForm,
    image: Option<ImageUpload>,
) -> Result<PostForm> {
    state.posts().clean_form(&form).await?;
    if let Some(image) = image {
        form.image = Some(state.media.save(&image).await?);
    }
    Ok(form)
}

/// POST /create/ as `multipart/form-data`.
pub async fn create_post_upload(
    user: AuthUser,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let (form, image) = read_post_multipart(&state.media, payload).await?;
    let form = attach_image(&state, form, image).await?;
    state.posts().create_post(user.id, &form).await?;
    Ok(redirect(profile_url(&user.username)))
}

/// POST /posts/{id}/edit/ as `multipart/form-data`. Ownership is checked
/// before the body is read so a refused edit never stores a file.
pub async fn edit_post_upload(
    user: AuthUser,
    state: web::Data<AppState>,
    post_id: web::Path<PostId>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let post = state.posts().get_post(post_id).await?;
    if let Err(AppError::Forbidden(reason)) = check_post_update(user.id, &post) {
        return Ok(refuse_edit(&user, post_id, &reason));
    }

    let (form, image) = read_post_multipart(&state.media, payload).await?;
    let form = attach_image(&state, form, image).await?;
    let result = state.posts().edit_post(post_id, user.id, &form).await;
    edit_response(&user, post_id, result)
}
