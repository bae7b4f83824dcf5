//! Prescription endpoints (doctor role).

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use super::CreatedResponse;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Caller};
use crate::models::{NewPrescription, Prescription};
use crate::prescriptions::{self, SavePrescriptionOutcome};
use crate::validation::Validate;
use crate::workflows;

#[derive(Serialize)]
pub struct PrescriptionsResponse {
    pub prescriptions: Vec<Prescription>,
}

/// `POST /api/prescriptions`: save, then complete the appointment.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<NewPrescription>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse<String>>), ApiError> {
    let Json(prescription) = payload?;
    prescription.validate()?;

    let outcome = {
        let clinic = ctx.state.clinic_db()?;
        let store = ctx.state.prescription_db()?;
        workflows::issue_prescription(&clinic, &store, ctx.state.tokens(), &prescription, &caller.token)
    };
    match outcome {
        SavePrescriptionOutcome::Saved { id } => Ok((
            StatusCode::CREATED,
            Json(CreatedResponse {
                id,
                message: "Prescription saved successfully",
            }),
        )),
        SavePrescriptionOutcome::AlreadyExists => Err(ApiError::Conflict(
            "A prescription already exists for this appointment".into(),
        )),
        SavePrescriptionOutcome::Failed => Err(ApiError::Internal("prescription save failed".into())),
    }
}

/// `GET /api/prescriptions/:appointment_id`
pub async fn by_appointment(
    State(ctx): State<ApiContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<PrescriptionsResponse>, ApiError> {
    let Path(appointment_id) = path?;
    let store = ctx.state.prescription_db()?;
    let prescriptions = prescriptions::get_by_appointment(&store, appointment_id)?;
    if prescriptions.is_empty() {
        return Err(ApiError::NotFound(
            "No prescriptions found for this appointment".into(),
        ));
    }
    Ok(Json(PrescriptionsResponse { prescriptions }))
}
