use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::state::AppState;

/// GET /media/{key} - a stored post image.
pub async fn media_file(
    state: web::Data<AppState>,
    key: web::Path<String>,
) -> Result<HttpResponse> {
    let (format, body) = state.media.open(&key).await?;
    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .body(body))
}
