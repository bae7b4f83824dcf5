//! Admin authentication.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{finish_login, TokenResponse};
use crate::admins;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Debug, Deserialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

/// `POST /api/admin/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<AdminLogin>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = payload?;
    let credential = {
        let conn = ctx.state.clinic_db()?;
        admins::credential(&conn, &body.username)?
    };
    finish_login(&ctx.state, credential, body.password).await
}
