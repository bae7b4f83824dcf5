//! Doctor directory: registration, profile edits, lookups, login and
//! per-day slot availability.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;
use thiserror::Error;

use crate::authorization::Credential;
use crate::crypto::TokenService;
use crate::db::repository::{
    delete_appointments_for_doctor, delete_doctor, doctor_email_exists, doctor_exists,
    find_appointments_by_doctor_between, find_doctor_by_email, get_all_doctors, get_doctor,
    insert_doctor, update_doctor_profile,
};
use crate::db::DatabaseError;
use crate::models::{Doctor, DoctorFilter, DoctorUpdate, NewDoctor};

// ─── Outcomes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDoctorOutcome {
    Saved { id: i64 },
    AlreadyExists,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDoctorOutcome {
    Updated,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDoctorOutcome {
    Deleted,
    NotFound,
    Failed,
}

/// Whether one concrete slot is still free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCheck {
    UnknownDoctor,
    Available,
    Unavailable,
}

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ─── Mutations ────────────────────────────────────────────────────────────────

/// Register a doctor. The email must not belong to another doctor.
///
/// `password_hash` is the PHC string of `doctor.password`, computed by the
/// caller outside the store lock.
pub fn save(conn: &Connection, doctor: &NewDoctor, password_hash: String) -> SaveDoctorOutcome {
    match try_save(conn, doctor, password_hash) {
        Ok(outcome) => {
            if let SaveDoctorOutcome::Saved { id } = outcome {
                tracing::info!(doctor_id = id, "Doctor registered");
            }
            outcome
        }
        Err(e) => {
            tracing::error!(error = %e, "Doctor registration failed");
            SaveDoctorOutcome::Failed
        }
    }
}

fn try_save(
    conn: &Connection,
    doctor: &NewDoctor,
    password_hash: String,
) -> Result<SaveDoctorOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    if doctor_email_exists(&tx, &doctor.email)? {
        return Ok(SaveDoctorOutcome::AlreadyExists);
    }
    let id = insert_doctor(&tx, &Doctor {
        id: 0,
        name: doctor.name.clone(),
        specialty: doctor.specialty.clone(),
        email: doctor.email.clone(),
        password_hash,
        phone: doctor.phone.clone(),
        available_times: doctor.available_times.clone(),
    })?;
    tx.commit()?;
    Ok(SaveDoctorOutcome::Saved { id })
}

/// Overwrite name, email, specialty and slot template. Password and phone
/// stay as registered.
pub fn update(conn: &Connection, id: i64, update: &DoctorUpdate) -> UpdateDoctorOutcome {
    try_update(conn, id, update).unwrap_or_else(|e| {
        tracing::error!(doctor_id = id, error = %e, "Doctor update failed");
        UpdateDoctorOutcome::Failed
    })
}

fn try_update(conn: &Connection, id: i64, update: &DoctorUpdate) -> Result<UpdateDoctorOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    if !doctor_exists(&tx, id)? {
        return Ok(UpdateDoctorOutcome::NotFound);
    }
    update_doctor_profile(&tx, id, update)?;
    tx.commit()?;
    Ok(UpdateDoctorOutcome::Updated)
}

/// Delete a doctor together with all of their appointments.
pub fn delete(conn: &Connection, id: i64) -> DeleteDoctorOutcome {
    try_delete(conn, id).unwrap_or_else(|e| {
        tracing::error!(doctor_id = id, error = %e, "Doctor delete failed");
        DeleteDoctorOutcome::Failed
    })
}

fn try_delete(conn: &Connection, id: i64) -> Result<DeleteDoctorOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    if !doctor_exists(&tx, id)? {
        return Ok(DeleteDoctorOutcome::NotFound);
    }
    let removed = delete_appointments_for_doctor(&tx, id)?;
    delete_doctor(&tx, id)?;
    tx.commit()?;
    tracing::info!(doctor_id = id, appointments_removed = removed, "Doctor deleted");
    Ok(DeleteDoctorOutcome::Deleted)
}

// ─── Queries ──────────────────────────────────────────────────────────────────

pub fn list(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    get_all_doctors(conn)
}

/// Doctors matching every filter that is set: name substring and exact
/// specialty (both case-insensitive), and a slot in the template.
pub fn filter(conn: &Connection, filter: &DoctorFilter) -> Result<Vec<Doctor>, DatabaseError> {
    let name = filter.name.as_deref().map(str::to_lowercase);
    let doctors = get_all_doctors(conn)?
        .into_iter()
        .filter(|d| match &name {
            Some(n) => d.name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .filter(|d| match &filter.specialty {
            Some(s) => d.specialty.eq_ignore_ascii_case(s),
            None => true,
        })
        .filter(|d| match filter.time {
            Some(t) => d.available_times.contains(&t),
            None => true,
        })
        .collect();
    Ok(doctors)
}

/// Login secret for `email`. The token subject is the email as submitted.
pub fn credential(conn: &Connection, email: &str) -> Result<Option<Credential>, DatabaseError> {
    Ok(find_doctor_by_email(conn, email)?.map(|doctor| Credential {
        subject: email.to_string(),
        password_hash: doctor.password_hash,
    }))
}

/// Doctor named by the token's subject, if the token is valid.
pub fn resolve_doctor(
    conn: &Connection,
    tokens: &TokenService,
    token: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    match tokens.extract_subject(token) {
        Some(email) => find_doctor_by_email(conn, &email),
        None => Ok(None),
    }
}

// ─── Availability ─────────────────────────────────────────────────────────────

/// Template slots of `doctor_id` not taken by a booking on `date`, in
/// template order. Bookings suppress slots by time-of-day.
pub fn availability(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
) -> Result<Vec<NaiveTime>, AvailabilityError> {
    let doctor = get_doctor(conn, doctor_id)?.ok_or(AvailabilityError::DoctorNotFound(doctor_id))?;

    let day_start = date.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::seconds(86_399);
    let booked: HashSet<NaiveTime> =
        find_appointments_by_doctor_between(conn, doctor_id, day_start, day_end)?
            .iter()
            .map(|a| a.time_only())
            .collect();

    Ok(doctor
        .available_times
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect())
}

pub fn check_slot(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<SlotCheck, DatabaseError> {
    match availability(conn, doctor_id, date) {
        Ok(slots) if slots.contains(&time) => Ok(SlotCheck::Available),
        Ok(_) => Ok(SlotCheck::Unavailable),
        Err(AvailabilityError::DoctorNotFound(_)) => Ok(SlotCheck::UnknownDoctor),
        Err(AvailabilityError::Database(e)) => Err(e),
    }
}
