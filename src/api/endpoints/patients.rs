//! Patient endpoints.
//!
//! - `POST /api/patients/register`, `POST /api/patients/login`: public
//! - `GET /api/patients/me`, `GET /api/patients/appointments`: patient
//! - `GET /api/patients`: admin

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::{finish_login, hash_off_executor, CreatedResponse, EmailLogin, TokenResponse};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Caller};
use crate::appointments;
use crate::models::{AppointmentDetails, NewPatient, Patient, PatientAppointmentFilter, VisitCondition};
use crate::patients::{self, RegisterOutcome};
use crate::validation::Validate;

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<Patient>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentDetails>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentParams {
    pub condition: Option<String>,
    pub doctor: Option<String>,
}

/// `POST /api/patients/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<i64>>), ApiError> {
    let Json(patient) = payload?;
    patient.validate()?;

    let password_hash = hash_off_executor(&ctx.state, patient.password.clone()).await?;
    let outcome = {
        let conn = ctx.state.clinic_db()?;
        patients::register(&conn, &patient, password_hash)
    };
    match outcome {
        RegisterOutcome::Registered { id } => Ok((
            StatusCode::CREATED,
            Json(CreatedResponse {
                id,
                message: "Patient registered successfully",
            }),
        )),
        RegisterOutcome::AlreadyExists => Err(ApiError::Conflict(
            "Patient with this email or phone already exists".into(),
        )),
        RegisterOutcome::Failed => Err(ApiError::Internal("patient registration failed".into())),
    }
}

/// `POST /api/patients/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<EmailLogin>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = payload?;
    let credential = {
        let conn = ctx.state.clinic_db()?;
        patients::credential(&conn, &body.email)?
    };
    finish_login(&ctx.state, credential, body.password).await
}

/// `GET /api/patients/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.state.clinic_db()?;
    patients::details(&conn, ctx.state.tokens(), &caller.token)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))
}

/// `GET /api/patients/appointments?condition=past|future&doctor=`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<AppointmentParams>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let filter = PatientAppointmentFilter {
        condition: params
            .condition
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(VisitCondition::from_label),
        doctor_name: params.doctor.filter(|s| !s.is_empty()),
    };
    let conn = ctx.state.clinic_db()?;
    let appointments = appointments::filter_for_patient(&conn, ctx.state.tokens(), &caller.token, &filter);
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `GET /api/patients`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = ctx.state.clinic_db()?;
    let patients = patients::list(&conn)?;
    Ok(Json(PatientsResponse { patients }))
}
