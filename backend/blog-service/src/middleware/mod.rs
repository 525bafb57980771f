/// HTTP middleware utilities for blog-service
///
/// Request identity extractors (session token from the `Authorization` header
/// or the `session` cookie), the admin token guard, and request metrics.
pub mod permissions;

pub use permissions::*;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

use crate::error::{self, AppError};
use crate::metrics::feed::HTTP_REQUESTS_TOTAL;
use crate::models::UserId;
use crate::security::SESSION_COOKIE;
use crate::state::AppState;

/// Header carrying the admin token
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

// =====================================================================
// Session authentication
// =====================================================================

/// Logged-in caller. Extraction fails with a redirect to the login page.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
}

/// Caller identity for pages that are public but vary for logged-in users.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

fn app_state(req: &HttpRequest) -> error::Result<&web::Data<AppState>> {
    req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state not configured".to_string()))
}

fn session_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    bearer.or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
}

fn authenticate(req: &HttpRequest) -> error::Result<AuthUser> {
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string());
    let unauthenticated = || AppError::Unauthenticated { next: next.clone() };

    let state = app_state(req)?;
    let token = session_token(req).ok_or_else(unauthenticated)?;
    let claims = state
        .jwt
        .validate_token(&token)
        .map_err(|_| unauthenticated())?;
    let id = claims.sub.parse::<UserId>().map_err(|_| unauthenticated())?;

    Ok(AuthUser {
        id,
        username: claims.username,
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeUser(authenticate(req).ok())))
    }
}

// =====================================================================
// Admin guard
// =====================================================================

/// Proof that the request carried the configured admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

fn check_admin(req: &HttpRequest) -> error::Result<AdminAccess> {
    let Some(expected) = app_state(req)?.admin_token.as_deref() else {
        return Err(AppError::NotFound(req.path().to_string()));
    };

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());
    if provided == Some(expected) {
        Ok(AdminAccess)
    } else {
        Err(AppError::Forbidden("admin token missing or invalid".to_string()))
    }
}

impl FromRequest for AdminAccess {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(check_admin(req))
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let status = match &res {
                Ok(resp) => resp.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            HTTP_REQUESTS_TOTAL
                .with_label_values(&[method.as_str(), status.as_str()])
                .inc();

            let elapsed = start.elapsed().as_millis();
            tracing::debug!(%method, %path, status = status.as_u16(), %elapsed, "request completed");
            res
        })
    }
}
