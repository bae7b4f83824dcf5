//! `GET /api/availability/:role/:doctor_id/:date`
//!
//! Public route; the bearer token is checked here against the role named
//! in the path rather than by a route-group middleware.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveTime;

use super::parse_date;
use crate::api::error::ApiError;
use crate::api::middleware::auth::bearer_token;
use crate::api::types::ApiContext;
use crate::authorization::{validate_token, DirectoryResolver};
use crate::doctors::{self, AvailabilityError};

pub async fn for_doctor(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    path: Result<Path<(String, i64, String)>, PathRejection>,
) -> Result<Json<Vec<NaiveTime>>, ApiError> {
    let Path((role, doctor_id, date)) = path?;
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    let date = parse_date(&date)?;

    let conn = ctx.state.clinic_db()?;
    if !validate_token(ctx.state.tokens(), &DirectoryResolver::new(&conn), token, &role) {
        return Err(ApiError::Unauthorized);
    }
    match doctors::availability(&conn, doctor_id, date) {
        Ok(slots) => Ok(Json(slots)),
        Err(AvailabilityError::DoctorNotFound(_)) => Err(ApiError::NotFound("Doctor not found".into())),
        Err(AvailabilityError::Database(e)) => Err(e.into()),
    }
}
