//! Patient directory: self-registration, login and profile lookups.

use rusqlite::Connection;

use crate::authorization::Credential;
use crate::crypto::TokenService;
use crate::db::repository::{
    find_patient_by_email, find_patient_by_email_or_phone, get_all_patients, insert_patient,
};
use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered { id: i64 },
    /// Email (any case) or phone already belongs to a patient.
    AlreadyExists,
    Failed,
}

/// `password_hash` is the PHC string of `patient.password`, computed by the
/// caller outside the store lock.
pub fn register(conn: &Connection, patient: &NewPatient, password_hash: String) -> RegisterOutcome {
    match try_register(conn, patient, password_hash) {
        Ok(outcome) => {
            if let RegisterOutcome::Registered { id } = outcome {
                tracing::info!(patient_id = id, "Patient registered");
            }
            outcome
        }
        Err(e) => {
            tracing::error!(error = %e, "Patient registration failed");
            RegisterOutcome::Failed
        }
    }
}

fn try_register(
    conn: &Connection,
    patient: &NewPatient,
    password_hash: String,
) -> Result<RegisterOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    if find_patient_by_email_or_phone(&tx, &patient.email, &patient.phone)?.is_some() {
        return Ok(RegisterOutcome::AlreadyExists);
    }
    let id = insert_patient(&tx, &Patient {
        id: 0,
        name: patient.name.clone(),
        email: patient.email.clone(),
        password_hash,
        phone: patient.phone.clone(),
        address: patient.address.clone(),
    })?;
    tx.commit()?;
    Ok(RegisterOutcome::Registered { id })
}

/// Login secret for `email` (any case).
pub fn credential(conn: &Connection, email: &str) -> Result<Option<Credential>, DatabaseError> {
    // Subject is the stored email so later lookups match exactly
    Ok(find_patient_by_email(conn, email)?.map(|patient| Credential {
        subject: patient.email,
        password_hash: patient.password_hash,
    }))
}

/// Patient named by the token's subject, if the token is valid.
pub fn resolve_patient(
    conn: &Connection,
    tokens: &TokenService,
    token: &str,
) -> Result<Option<Patient>, DatabaseError> {
    match tokens.extract_subject(token) {
        Some(email) => find_patient_by_email(conn, &email),
        None => Ok(None),
    }
}

/// Profile of the requesting patient.
pub fn details(
    conn: &Connection,
    tokens: &TokenService,
    token: &str,
) -> Result<Option<Patient>, DatabaseError> {
    resolve_patient(conn, tokens, token)
}

pub fn list(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    get_all_patients(conn)
}
