//! Appointment booking, rescheduling, cancellation and the doctor and
//! patient views over them.
//!
//! Every operation takes the requester's bearer token and resolves it to a
//! patient or doctor itself; role gating in the HTTP layer only guarantees
//! the token names *some* account of the right kind.
//!
//! Booking performs no overlap check. Only rescheduling enforces the
//! ±30 minute conflict window, and that window does not exclude the
//! appointment being moved: re-saving an appointment at its own time
//! reports `Conflict`.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::crypto::TokenService;
use crate::db::repository::{
    delete_appointment, find_appointments_by_doctor_between, find_details_by_doctor_in_range,
    find_details_by_doctor_name_and_patient, find_details_by_patient,
    find_details_by_patient_and_status, get_appointment, insert_appointment,
    update_appointment_slot, update_appointment_status,
};
use crate::db::DatabaseError;
use crate::doctors::resolve_doctor;
use crate::models::{AppointmentChange, AppointmentDetails, NewAppointment, PatientAppointmentFilter};
use crate::patients::resolve_patient;

/// Half-width of the doctor double-booking window.
pub const CONFLICT_WINDOW_MINUTES: i64 = 30;

// ─── Outcomes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked { id: i64 },
    /// Requester unresolvable or the store rejected the row. No detail.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    Unauthorized,
    /// Target doctor already has an appointment within the window.
    Conflict,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
    Unauthorized,
    Failed,
}

/// Result of a status change. Callers that follow the silent-no-op contract
/// may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Applied,
    /// Unknown appointment, or the requester is not its doctor.
    Ignored,
    Failed,
}

// ─── Patient operations ───────────────────────────────────────────────────────

/// Book for the requesting patient. Any `patient_id` in the payload is
/// replaced by the token's patient.
pub fn book(
    conn: &Connection,
    tokens: &TokenService,
    appointment: &NewAppointment,
    token: &str,
) -> BookingOutcome {
    match try_book(conn, tokens, appointment, token) {
        Ok(Some(id)) => {
            tracing::info!(appointment_id = id, doctor_id = appointment.doctor_id, "Appointment booked");
            BookingOutcome::Booked { id }
        }
        Ok(None) => {
            tracing::warn!("Booking rejected: requester is not a patient");
            BookingOutcome::Failed
        }
        Err(e) => {
            tracing::error!(error = %e, "Booking failed");
            BookingOutcome::Failed
        }
    }
}

fn try_book(
    conn: &Connection,
    tokens: &TokenService,
    appointment: &NewAppointment,
    token: &str,
) -> Result<Option<i64>, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let Some(patient) = resolve_patient(&tx, tokens, token)? else {
        return Ok(None);
    };
    let id = insert_appointment(
        &tx,
        appointment.doctor_id,
        patient.id,
        appointment.appointment_time,
        appointment.status,
    )?;
    tx.commit()?;
    Ok(Some(id))
}

/// Move an appointment to a new doctor and time, refusing when the target
/// doctor has any appointment within `CONFLICT_WINDOW_MINUTES` either side.
pub fn update(
    conn: &Connection,
    tokens: &TokenService,
    id: i64,
    change: &AppointmentChange,
    token: &str,
) -> UpdateOutcome {
    let outcome = try_update(conn, tokens, id, change, token).unwrap_or_else(|e| {
        tracing::error!(appointment_id = id, error = %e, "Appointment update failed");
        UpdateOutcome::Failed
    });
    match outcome {
        UpdateOutcome::Updated => tracing::info!(appointment_id = id, "Appointment rescheduled"),
        UpdateOutcome::Conflict => {
            tracing::info!(appointment_id = id, doctor_id = change.doctor_id, "Reschedule conflicts")
        }
        _ => {}
    }
    outcome
}

fn try_update(
    conn: &Connection,
    tokens: &TokenService,
    id: i64,
    change: &AppointmentChange,
    token: &str,
) -> Result<UpdateOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let Some(existing) = get_appointment(&tx, id)? else {
        return Ok(UpdateOutcome::NotFound);
    };
    match resolve_patient(&tx, tokens, token)? {
        Some(patient) if patient.id == existing.patient_id => {}
        _ => return Ok(UpdateOutcome::Unauthorized),
    }

    if has_conflict(&tx, change.doctor_id, change.appointment_time)? {
        return Ok(UpdateOutcome::Conflict);
    }

    update_appointment_slot(&tx, id, change.doctor_id, change.appointment_time)?;
    tx.commit()?;
    Ok(UpdateOutcome::Updated)
}

/// Any appointment of `doctor_id` within `[time - window, time + window]`.
fn has_conflict(conn: &Connection, doctor_id: i64, time: NaiveDateTime) -> Result<bool, DatabaseError> {
    let window = Duration::minutes(CONFLICT_WINDOW_MINUTES);
    let clashes = find_appointments_by_doctor_between(conn, doctor_id, time - window, time + window)?;
    Ok(!clashes.is_empty())
}

/// Hard-delete an appointment owned by the requesting patient.
pub fn cancel(conn: &Connection, tokens: &TokenService, id: i64, token: &str) -> CancelOutcome {
    let outcome = try_cancel(conn, tokens, id, token).unwrap_or_else(|e| {
        tracing::error!(appointment_id = id, error = %e, "Appointment cancel failed");
        CancelOutcome::Failed
    });
    if outcome == CancelOutcome::Cancelled {
        tracing::info!(appointment_id = id, "Appointment cancelled");
    }
    outcome
}

fn try_cancel(
    conn: &Connection,
    tokens: &TokenService,
    id: i64,
    token: &str,
) -> Result<CancelOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    // Existence first: a repeated cancel is NotFound, never Unauthorized
    let Some(existing) = get_appointment(&tx, id)? else {
        return Ok(CancelOutcome::NotFound);
    };
    match resolve_patient(&tx, tokens, token)? {
        Some(patient) if patient.id == existing.patient_id => {}
        _ => return Ok(CancelOutcome::Unauthorized),
    }
    delete_appointment(&tx, id)?;
    tx.commit()?;
    Ok(CancelOutcome::Cancelled)
}

/// Every appointment of the requesting patient.
pub fn list_for_patient(conn: &Connection, tokens: &TokenService, token: &str) -> Vec<AppointmentDetails> {
    let result = resolve_patient(conn, tokens, token).and_then(|patient| match patient {
        Some(p) => find_details_by_patient(conn, p.id),
        None => Ok(Vec::new()),
    });
    or_empty(result, "patient appointment list")
}

/// Requesting patient's appointments narrowed by visit condition (past
/// means completed, anything else scheduled) and doctor-name substring.
pub fn filter_for_patient(
    conn: &Connection,
    tokens: &TokenService,
    token: &str,
    filter: &PatientAppointmentFilter,
) -> Vec<AppointmentDetails> {
    let result = resolve_patient(conn, tokens, token).and_then(|patient| {
        let Some(patient) = patient else {
            return Ok(Vec::new());
        };
        let status = filter.condition.map(|c| c.status());
        match (&filter.doctor_name, status) {
            (Some(name), status) => find_details_by_doctor_name_and_patient(conn, name, patient.id, status),
            (None, Some(status)) => find_details_by_patient_and_status(conn, patient.id, status),
            (None, None) => find_details_by_patient(conn, patient.id),
        }
    });
    or_empty(result, "patient appointment filter")
}

// ─── Doctor operations ────────────────────────────────────────────────────────

/// Requesting doctor's appointments in `[day_start, day_end)`, optionally
/// narrowed to patient names containing `patient_name` (any case).
pub fn list_for_doctor(
    conn: &Connection,
    tokens: &TokenService,
    token: &str,
    day_start: NaiveDateTime,
    day_end: NaiveDateTime,
    patient_name: Option<&str>,
) -> Vec<AppointmentDetails> {
    let result = resolve_doctor(conn, tokens, token).and_then(|doctor| match doctor {
        Some(d) => find_details_by_doctor_in_range(conn, d.id, day_start, day_end, patient_name),
        None => Ok(Vec::new()),
    });
    or_empty(result, "doctor appointment list")
}

/// Set the status of an appointment owned by the requesting doctor.
/// Anything else is silently ignored.
pub fn change_status(
    conn: &Connection,
    tokens: &TokenService,
    id: i64,
    status: i32,
    token: &str,
) -> StatusChange {
    match try_change_status(conn, tokens, id, status, token) {
        Ok(change) => {
            if change == StatusChange::Applied {
                tracing::info!(appointment_id = id, status, "Appointment status changed");
            }
            change
        }
        Err(e) => {
            tracing::error!(appointment_id = id, error = %e, "Status change failed");
            StatusChange::Failed
        }
    }
}

fn try_change_status(
    conn: &Connection,
    tokens: &TokenService,
    id: i64,
    status: i32,
    token: &str,
) -> Result<StatusChange, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let Some(doctor) = resolve_doctor(&tx, tokens, token)? else {
        return Ok(StatusChange::Ignored);
    };
    match get_appointment(&tx, id)? {
        Some(appointment) if appointment.doctor_id == doctor.id => {
            update_appointment_status(&tx, id, status)?;
            tx.commit()?;
            Ok(StatusChange::Applied)
        }
        _ => Ok(StatusChange::Ignored),
    }
}

fn or_empty(result: Result<Vec<AppointmentDetails>, DatabaseError>, view: &str) -> Vec<AppointmentDetails> {
    result.unwrap_or_else(|e| {
        tracing::error!(view, error = %e, "Appointment query failed");
        Vec::new()
    })
}
