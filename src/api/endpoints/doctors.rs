//! Doctor directory endpoints.
//!
//! - `POST /api/doctors/login`: public
//! - `GET /api/doctors`, `GET /api/doctors/filter`,
//!   `GET /api/doctors/:id/slots/:date/:time`: public
//! - `POST /api/doctors`, `PUT|DELETE /api/doctors/:id`: admin

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{
    finish_login, hash_off_executor, parse_date, parse_time, CreatedResponse, EmailLogin,
    MessageResponse, TokenResponse,
};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::doctors::{self, DeleteDoctorOutcome, SaveDoctorOutcome, SlotCheck, UpdateDoctorOutcome};
use crate::models::{Doctor, DoctorFilter, DoctorUpdate, NewDoctor};
use crate::validation::Validate;

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<Doctor>,
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub time: Option<String>,
}

#[derive(Serialize)]
pub struct SlotResponse {
    pub status: &'static str,
}

/// `POST /api/doctors/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<EmailLogin>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = payload?;
    let credential = {
        let conn = ctx.state.clinic_db()?;
        doctors::credential(&conn, &body.email)?
    };
    finish_login(&ctx.state, credential, body.password).await
}

/// `GET /api/doctors`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<DoctorsResponse>, ApiError> {
    let conn = ctx.state.clinic_db()?;
    let doctors = doctors::list(&conn)?;
    Ok(Json(DoctorsResponse { doctors }))
}

/// `GET /api/doctors/filter?name=&specialty=&time=`
pub async fn filter(
    State(ctx): State<ApiContext>,
    Query(params): Query<FilterParams>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let filter = DoctorFilter {
        name: params.name.filter(|s| !s.is_empty()),
        specialty: params.specialty.filter(|s| !s.is_empty()),
        time: params
            .time
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_time)
            .transpose()?,
    };
    let conn = ctx.state.clinic_db()?;
    let doctors = doctors::filter(&conn, &filter)?;
    Ok(Json(DoctorsResponse { doctors }))
}

/// `GET /api/doctors/:id/slots/:date/:time`
pub async fn check_slot(
    State(ctx): State<ApiContext>,
    path: Result<Path<(i64, String, String)>, PathRejection>,
) -> Result<Json<SlotResponse>, ApiError> {
    let Path((doctor_id, date, time)) = path?;
    let date = parse_date(&date)?;
    let time = parse_time(&time)?;
    let check = {
        let conn = ctx.state.clinic_db()?;
        doctors::check_slot(&conn, doctor_id, date, time)?
    };
    match check {
        SlotCheck::Available => Ok(Json(SlotResponse { status: "available" })),
        SlotCheck::Unavailable => Ok(Json(SlotResponse { status: "unavailable" })),
        SlotCheck::UnknownDoctor => Err(ApiError::NotFound("Doctor not found".into())),
    }
}

/// `POST /api/doctors`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewDoctor>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<i64>>), ApiError> {
    let Json(doctor) = payload?;
    doctor.validate()?;

    let password_hash = hash_off_executor(&ctx.state, doctor.password.clone()).await?;
    let outcome = {
        let conn = ctx.state.clinic_db()?;
        doctors::save(&conn, &doctor, password_hash)
    };
    match outcome {
        SaveDoctorOutcome::Saved { id } => Ok((
            StatusCode::CREATED,
            Json(CreatedResponse {
                id,
                message: "Doctor saved successfully",
            }),
        )),
        SaveDoctorOutcome::AlreadyExists => {
            Err(ApiError::Conflict("Doctor with this email already exists".into()))
        }
        SaveDoctorOutcome::Failed => Err(ApiError::Internal("doctor save failed".into())),
    }
}

/// `PUT /api/doctors/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DoctorUpdate>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let Json(change) = payload?;
    change.validate()?;

    let outcome = {
        let conn = ctx.state.clinic_db()?;
        doctors::update(&conn, id, &change)
    };
    match outcome {
        UpdateDoctorOutcome::Updated => Ok(Json(MessageResponse {
            message: "Doctor updated successfully",
        })),
        UpdateDoctorOutcome::NotFound => Err(ApiError::NotFound("Doctor not found".into())),
        UpdateDoctorOutcome::Failed => Err(ApiError::Internal("doctor update failed".into())),
    }
}

/// `DELETE /api/doctors/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let outcome = {
        let conn = ctx.state.clinic_db()?;
        doctors::delete(&conn, id)
    };
    match outcome {
        DeleteDoctorOutcome::Deleted => Ok(Json(MessageResponse {
            message: "Doctor deleted successfully",
        })),
        DeleteDoctorOutcome::NotFound => Err(ApiError::NotFound("Doctor not found".into())),
        DeleteDoctorOutcome::Failed => Err(ApiError::Internal("doctor delete failed".into())),
    }
}
