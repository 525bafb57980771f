/// Signup and login
///
/// Login answers with a bearer token and also sets it as the `session`
/// cookie, so browser-style clients and API clients share one flow.
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::redirect;
use crate::error::Result;
use crate::models::{LoginForm, SignupForm};
use crate::security::SESSION_COOKIE;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/auth/login/";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user_id: i64,
    pub username: String,
}

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
}

/// GET /auth/signup/
pub async fn signup_form() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "form": SignupForm::fields() }))
}

/// POST /auth/signup/ - redirects to the login page.
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Json<SignupForm>,
) -> Result<HttpResponse> {
    state.users().register(&form).await?;
    Ok(redirect(LOGIN_PATH))
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "form": LoginForm::fields(),
        "next": safe_next(query.next.as_deref()),
    }))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse> {
    let (username, password) = form.clean()?;
    let user = state.users().authenticate(&username, &password).await?;
    let token = state.jwt.issue_token(&user)?;
    tracing::info!(user_id = user.id, "user logged in");

    let cookie = Cookie::build(SESSION_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    if let Some(next) = safe_next(query.next.as_deref()) {
        return Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, next))
            .cookie(cookie)
            .finish());
    }

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        user_id: user.id,
        username: user.username,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/create/")), Some("/create/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
