//! Audit logging middleware.
//!
//! Logs every authenticated API request with caller, method, path and
//! response status. Runs innermost (after auth has injected `Caller`).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::Caller;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let caller = req
        .extensions()
        .get::<Caller>()
        .map(|c| (c.role.as_str(), c.subject.clone()));

    let response = next.run(req).await;

    let status = response.status().as_u16();
    match caller {
        Some((role, subject)) => {
            tracing::info!(%method, %path, role, %subject, status, "API access")
        }
        None => tracing::info!(%method, %path, status, "API access"),
    }

    response
}
