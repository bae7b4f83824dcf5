//! Appointment endpoints.
//!
//! Patient routes: `GET|POST /api/appointments`, `PUT|DELETE /api/appointments/:id`.
//! Doctor routes: `GET /api/appointments/doctor`,
//! `PUT /api/appointments/:id/status/:status`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{Duration, Local, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{parse_date, CreatedResponse, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Caller};
use crate::appointments::{self, BookingOutcome, CancelOutcome, UpdateOutcome};
use crate::models::{AppointmentChange, AppointmentDetails, NewAppointment};
use crate::validation::{known_status, Validate};

#[derive(Debug, Deserialize)]
pub struct DayParams {
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<String>,
    pub patient_name: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentDetails>,
}

/// `POST /api/appointments`
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<NewAppointment>, JsonRejection>,
) -> Result<Json<CreatedResponse<i64>>, ApiError> {
    let Json(appointment) = payload?;
    appointment.validate()?;

    let outcome = {
        let conn = ctx.state.clinic_db()?;
        appointments::book(&conn, ctx.state.tokens(), &appointment, &caller.token)
    };
    match outcome {
        BookingOutcome::Booked { id } => Ok(Json(CreatedResponse {
            id,
            message: "Appointment booked successfully",
        })),
        BookingOutcome::Failed => Err(ApiError::Internal("booking failed".into())),
    }
}

/// `GET /api/appointments`: every appointment of the calling patient.
pub async fn mine(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.state.clinic_db()?;
    let appointments = appointments::list_for_patient(&conn, ctx.state.tokens(), &caller.token);
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `PUT /api/appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AppointmentChange>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let Json(change) = payload?;
    change.validate()?;

    let outcome = {
        let conn = ctx.state.clinic_db()?;
        appointments::update(&conn, ctx.state.tokens(), id, &change, &caller.token)
    };
    match outcome {
        UpdateOutcome::Updated => Ok(Json(MessageResponse {
            message: "Appointment updated successfully",
        })),
        UpdateOutcome::NotFound => Err(ApiError::NotFound("Appointment not found".into())),
        UpdateOutcome::Unauthorized => Err(ApiError::Forbidden(
            "Appointment belongs to another patient".into(),
        )),
        UpdateOutcome::Conflict => Err(ApiError::Conflict(
            "Doctor is not available at the requested time".into(),
        )),
        UpdateOutcome::Failed => Err(ApiError::Internal("appointment update failed".into())),
    }
}

/// `DELETE /api/appointments/:id`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let outcome = {
        let conn = ctx.state.clinic_db()?;
        appointments::cancel(&conn, ctx.state.tokens(), id, &caller.token)
    };
    match outcome {
        CancelOutcome::Cancelled => Ok(Json(MessageResponse {
            message: "Appointment cancelled successfully",
        })),
        CancelOutcome::NotFound => Err(ApiError::NotFound("Appointment not found".into())),
        CancelOutcome::Unauthorized => Err(ApiError::Forbidden(
            "Appointment belongs to another patient".into(),
        )),
        CancelOutcome::Failed => Err(ApiError::Internal("appointment cancel failed".into())),
    }
}

/// `GET /api/appointments/doctor?date=&patient_name=`
pub async fn for_doctor(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<DayParams>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let date = match params.date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };
    let day_start = date.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);
    let patient_name = params.patient_name.as_deref().filter(|s| !s.is_empty());

    let conn = ctx.state.clinic_db()?;
    let appointments = appointments::list_for_doctor(
        &conn,
        ctx.state.tokens(),
        &caller.token,
        day_start,
        day_end,
        patient_name,
    );
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `PUT /api/appointments/:id/status/:status`
///
/// Always 200 for a valid status: a non-owning doctor's change is ignored.
pub async fn change_status(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<(i64, i32)>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path((id, status)) = path?;
    known_status(status)?;
    let conn = ctx.state.clinic_db()?;
    appointments::change_status(&conn, ctx.state.tokens(), id, status, &caller.token);
    Ok(Json(MessageResponse {
        message: "Appointment status updated",
    }))
}
