//! API endpoint handlers, one module per resource.
//!
//! Handlers validate input, take the store lock for the duration of one
//! service call and map service outcomes to status codes. PBKDF2 work runs
//! on the blocking pool with no store lock held.

pub mod admin;
pub mod appointments;
pub mod availability;
pub mod doctors;
pub mod health;
pub mod patients;
pub mod prescriptions;

use std::sync::Arc;

use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::authorization::{check_credentials, Credential, LoginOutcome};
use crate::core_state::ClinicState;
use crate::crypto::hash_password;

/// `{ "email": .., "password": .. }`
#[derive(Debug, Deserialize)]
pub struct EmailLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse<T: Serialize> {
    pub id: T,
    pub message: &'static str,
}

/// Hash a new account's password on the blocking pool.
pub(crate) async fn hash_off_executor(state: &Arc<ClinicState>, password: String) -> Result<String, ApiError> {
    let rounds = state.password_rounds();
    tokio::task::spawn_blocking(move || hash_password(&password, rounds))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Finish a login whose credential was already read from the store:
/// verify on the blocking pool, then map the outcome for every login route.
pub(crate) async fn finish_login(
    state: &Arc<ClinicState>,
    credential: Option<Credential>,
    password: String,
) -> Result<Json<TokenResponse>, ApiError> {
    let state = Arc::clone(state);
    let outcome = tokio::task::spawn_blocking(move || {
        check_credentials(state.tokens(), credential.as_ref(), &password, state.login_decoy())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))?;

    match outcome {
        LoginOutcome::Token(token) => Ok(Json(TokenResponse { token })),
        LoginOutcome::InvalidCredentials => Err(ApiError::Unauthorized),
        LoginOutcome::Failed => Err(ApiError::Internal("login failed".into())),
    }
}

/// `YYYY-MM-DD`
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

/// `HH:MM:SS` or `HH:MM`
pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ApiError::BadRequest(format!("Invalid time '{raw}', expected HH:MM")))
}
