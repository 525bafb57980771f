use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::AdminAccess;
use crate::models::GroupForm;
use crate::state::AppState;

/// POST /admin/groups/
pub async fn create_group(
    _admin: AdminAccess,
    state: web::Data<AppState>,
    form: web::Json<GroupForm>,
) -> Result<HttpResponse> {
    let group = state.groups().create_group(&form).await?;
    Ok(HttpResponse::Created().json(group))
}
