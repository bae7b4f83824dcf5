use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Scheduled / pending.
pub const STATUS_SCHEDULED: i32 = 0;
/// Completed (set when a prescription is issued).
pub const STATUS_COMPLETED: i32 = 1;

/// Appointments last one hour.
pub const APPOINTMENT_LENGTH_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: NaiveDateTime,
    pub status: i32,
}

impl Appointment {
    pub fn end_time(&self) -> NaiveDateTime {
        self.appointment_time + Duration::minutes(APPOINTMENT_LENGTH_MINUTES)
    }

    pub fn date(&self) -> NaiveDate {
        self.appointment_time.date()
    }

    pub fn time_only(&self) -> NaiveTime {
        self.appointment_time.time()
    }
}

/// Booking payload. `patient_id` is accepted but always replaced by the
/// token-resolved patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub doctor_id: i64,
    #[serde(default)]
    pub patient_id: Option<i64>,
    pub appointment_time: NaiveDateTime,
    #[serde(default)]
    pub status: i32,
}

/// Reschedule payload: new doctor and time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentChange {
    pub doctor_id: i64,
    pub appointment_time: NaiveDateTime,
}

/// Flattened read model joining doctor and patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub id: i64,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_address: String,
    pub appointment_time: NaiveDateTime,
    pub status: i32,
    pub appointment_date: NaiveDate,
    pub appointment_time_only: NaiveTime,
    pub end_time: NaiveDateTime,
}
