//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, checks that the token's
//! subject exists in the directory of the route group's role, and injects
//! `Caller` into request extensions for downstream handlers.

use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Caller};
use crate::authorization::{has_role, DirectoryResolver};
use crate::models::Role;

pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Admin, req, next).await
}

pub async fn require_doctor(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Doctor, req, next).await
}

pub async fn require_patient(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Patient, req, next).await
}

async fn require_role(role: Role, req: Request<axum::body::Body>, next: Next) -> Response {
    match require_role_inner(role, req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_role_inner(
    role: Role,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let subject = ctx
        .state
        .tokens()
        .extract_subject(&token)
        .ok_or(ApiError::Unauthorized)?;

    let allowed = {
        let conn = ctx.state.clinic_db()?;
        has_role(&DirectoryResolver::new(&conn), &subject, role)
    }; // MutexGuard dropped here, before any .await
    if !allowed {
        tracing::warn!(role = role.as_str(), "Token subject lacks required role");
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(Caller {
        role,
        subject,
        token,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_required() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
