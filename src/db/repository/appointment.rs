use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{datetime_column, format_datetime};
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentDetails};

const APPOINTMENT_COLUMNS: &str = "id, doctor_id, patient_id, appointment_time, status";

const DETAILS_SELECT: &str =
    "SELECT a.id, a.doctor_id, d.name, a.patient_id, p.name, p.email, p.phone, p.address,
            a.appointment_time, a.status
     FROM appointments a
     JOIN doctors d ON d.id = a.doctor_id
     JOIN patients p ON p.id = a.patient_id";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(2)?,
        appointment_time: datetime_column(row, 3)?,
        status: row.get(4)?,
    })
}

fn details_from_row(row: &Row<'_>) -> rusqlite::Result<AppointmentDetails> {
    let appointment_time = datetime_column(row, 8)?;
    let appointment = Appointment {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(3)?,
        appointment_time,
        status: row.get(9)?,
    };
    Ok(AppointmentDetails {
        id: appointment.id,
        doctor_id: appointment.doctor_id,
        doctor_name: row.get(2)?,
        patient_id: appointment.patient_id,
        patient_name: row.get(4)?,
        patient_email: row.get(5)?,
        patient_phone: row.get(6)?,
        patient_address: row.get(7)?,
        appointment_time,
        status: appointment.status,
        appointment_date: appointment.date(),
        appointment_time_only: appointment.time_only(),
        end_time: appointment.end_time(),
    })
}

fn collect_details(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<AppointmentDetails>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, details_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_appointment(
    conn: &Connection,
    doctor_id: i64,
    patient_id: i64,
    appointment_time: NaiveDateTime,
    status: i32,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (doctor_id, patient_id, appointment_time, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![doctor_id, patient_id, format_datetime(appointment_time), status],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let appointment = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            appointment_from_row,
        )
        .optional()?;
    Ok(appointment)
}

/// Appointments of a doctor with `start <= time <= end` (both inclusive).
pub fn find_appointments_by_doctor_between(
    conn: &Connection,
    doctor_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE doctor_id = ?1 AND appointment_time >= ?2 AND appointment_time <= ?3
         ORDER BY appointment_time"
    ))?;
    let rows = stmt.query_map(
        params![doctor_id, format_datetime(start), format_datetime(end)],
        appointment_from_row,
    )?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Doctor's appointments with `start <= time < end`, optionally narrowed to
/// patients whose name contains `patient_name` (case-insensitive).
pub fn find_details_by_doctor_in_range(
    conn: &Connection,
    doctor_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
    patient_name: Option<&str>,
) -> Result<Vec<AppointmentDetails>, DatabaseError> {
    let start = format_datetime(start);
    let end = format_datetime(end);
    match patient_name {
        Some(name) => collect_details(
            conn,
            &format!(
                "{DETAILS_SELECT}
                 WHERE a.doctor_id = ?1 AND a.appointment_time >= ?2 AND a.appointment_time < ?3
                   AND instr(LOWER(p.name), LOWER(?4)) > 0
                 ORDER BY a.appointment_time"
            ),
            params![doctor_id, start, end, name],
        ),
        None => collect_details(
            conn,
            &format!(
                "{DETAILS_SELECT}
                 WHERE a.doctor_id = ?1 AND a.appointment_time >= ?2 AND a.appointment_time < ?3
                 ORDER BY a.appointment_time"
            ),
            params![doctor_id, start, end],
        ),
    }
}

pub fn find_details_by_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<AppointmentDetails>, DatabaseError> {
    collect_details(
        conn,
        &format!("{DETAILS_SELECT} WHERE a.patient_id = ?1 ORDER BY a.appointment_time"),
        params![patient_id],
    )
}

/// Patient's appointments with the given status, earliest first.
pub fn find_details_by_patient_and_status(
    conn: &Connection,
    patient_id: i64,
    status: i32,
) -> Result<Vec<AppointmentDetails>, DatabaseError> {
    collect_details(
        conn,
        &format!(
            "{DETAILS_SELECT} WHERE a.patient_id = ?1 AND a.status = ?2
             ORDER BY a.appointment_time ASC"
        ),
        params![patient_id, status],
    )
}

/// Patient's appointments with doctors whose name contains `doctor_name`
/// (case-insensitive), optionally restricted to one status.
pub fn find_details_by_doctor_name_and_patient(
    conn: &Connection,
    doctor_name: &str,
    patient_id: i64,
    status: Option<i32>,
) -> Result<Vec<AppointmentDetails>, DatabaseError> {
    match status {
        Some(status) => collect_details(
            conn,
            &format!(
                "{DETAILS_SELECT}
                 WHERE instr(LOWER(d.name), LOWER(?1)) > 0 AND a.patient_id = ?2 AND a.status = ?3
                 ORDER BY a.appointment_time ASC"
            ),
            params![doctor_name, patient_id, status],
        ),
        None => collect_details(
            conn,
            &format!(
                "{DETAILS_SELECT}
                 WHERE instr(LOWER(d.name), LOWER(?1)) > 0 AND a.patient_id = ?2
                 ORDER BY a.appointment_time ASC"
            ),
            params![doctor_name, patient_id],
        ),
    }
}

/// Move an appointment to a new doctor and time.
pub fn update_appointment_slot(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
    appointment_time: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "UPDATE appointments SET doctor_id = ?1, appointment_time = ?2 WHERE id = ?3",
        params![doctor_id, format_datetime(appointment_time), id],
    )?)
}

pub fn update_appointment_status(conn: &Connection, id: i64, status: i32) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status, id],
    )?)
}

pub fn delete_appointment(conn: &Connection, id: i64) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?)
}

pub fn delete_appointments_for_doctor(conn: &Connection, doctor_id: i64) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM appointments WHERE doctor_id = ?1",
        params![doctor_id],
    )?)
}
