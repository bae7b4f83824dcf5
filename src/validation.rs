//! Intake validation for request payloads.
//!
//! Field limits mirror the clinic's registration forms. Checks run at the
//! HTTP boundary before any service call; services assume well-formed input.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;

use crate::models::{
    AppointmentChange, DoctorUpdate, NewAppointment, NewDoctor, NewPatient, NewPrescription,
    STATUS_COMPLETED, STATUS_SCHEDULED,
};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Payloads that can be checked before reaching a service.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn length(field: &'static str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {min} and {max} characters"),
        ));
    }
    Ok(())
}

fn email(value: &str) -> Result<(), ValidationError> {
    if !EMAIL.is_match(value) {
        return Err(ValidationError::new("email", "invalid email format"));
    }
    Ok(())
}

fn phone(value: &str) -> Result<(), ValidationError> {
    if !PHONE.is_match(value) {
        return Err(ValidationError::new("phone", "must be exactly 10 digits"));
    }
    Ok(())
}

fn password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters long"),
        ));
    }
    Ok(())
}

/// Appointment times must lie strictly after `now`.
pub fn future_time(time: NaiveDateTime, now: NaiveDateTime) -> Result<(), ValidationError> {
    if time <= now {
        return Err(ValidationError::new(
            "appointment_time",
            "appointment time must be in the future",
        ));
    }
    Ok(())
}

/// Appointment status codes: 0 scheduled, 1 completed.
pub fn known_status(status: i32) -> Result<(), ValidationError> {
    if status != STATUS_SCHEDULED && status != STATUS_COMPLETED {
        return Err(ValidationError::new("status", format!("unknown status {status}")));
    }
    Ok(())
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

impl Validate for NewDoctor {
    fn validate(&self) -> Result<(), ValidationError> {
        length("name", &self.name, 3, 100)?;
        length("specialty", &self.specialty, 3, 50)?;
        email(&self.email)?;
        password(&self.password)?;
        phone(&self.phone)
    }
}

impl Validate for DoctorUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        length("name", &self.name, 3, 100)?;
        length("specialty", &self.specialty, 3, 50)?;
        email(&self.email)
    }
}

impl Validate for NewPatient {
    fn validate(&self) -> Result<(), ValidationError> {
        length("name", &self.name, 3, 100)?;
        email(&self.email)?;
        password(&self.password)?;
        phone(&self.phone)?;
        length("address", &self.address, 1, 255)
    }
}

impl Validate for NewPrescription {
    fn validate(&self) -> Result<(), ValidationError> {
        length("patient_name", &self.patient_name, 3, 100)?;
        length("medication", &self.medication, 3, 100)?;
        length("dosage", &self.dosage, 3, 100)?;
        if let Some(notes) = &self.doctor_notes {
            length("doctor_notes", notes, 0, 200)?;
        }
        Ok(())
    }
}

impl Validate for NewAppointment {
    fn validate(&self) -> Result<(), ValidationError> {
        future_time(self.appointment_time, local_now())?;
        known_status(self.status)
    }
}

impl Validate for AppointmentChange {
    fn validate(&self) -> Result<(), ValidationError> {
        future_time(self.appointment_time, local_now())
    }
}
