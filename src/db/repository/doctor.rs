use chrono::NaiveTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_time, time_column};
use crate::db::DatabaseError;
use crate::models::{Doctor, DoctorUpdate};

const DOCTOR_COLUMNS: &str = "id, name, specialty, email, password_hash, phone";

/// Map a doctors row; `available_times` is filled in by the caller.
fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        phone: row.get(5)?,
        available_times: Vec::new(),
    })
}

fn with_times(conn: &Connection, mut doctor: Doctor) -> Result<Doctor, DatabaseError> {
    doctor.available_times = get_available_times(conn, doctor.id)?;
    Ok(doctor)
}

/// Insert a doctor and its slot template. `doctor.id` is ignored.
pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (name, specialty, email, password_hash, phone)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doctor.name,
            doctor.specialty,
            doctor.email,
            doctor.password_hash,
            doctor.phone,
        ],
    )?;
    let id = conn.last_insert_rowid();
    replace_available_times(conn, id, &doctor.available_times)?;
    Ok(id)
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
            params![id],
            doctor_from_row,
        )
        .optional()?;
    doctor.map(|d| with_times(conn, d)).transpose()
}

pub fn find_doctor_by_email(conn: &Connection, email: &str) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE email = ?1"),
            params![email],
            doctor_from_row,
        )
        .optional()?;
    doctor.map(|d| with_times(conn, d)).transpose()
}

pub fn doctor_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM doctors WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub fn doctor_email_exists(conn: &Connection, email: &str) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM doctors WHERE email = ?1", params![email], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub fn get_all_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id"))?;
    let rows = stmt.query_map([], doctor_from_row)?;

    let mut doctors = Vec::new();
    for row in rows {
        doctors.push(with_times(conn, row?)?);
    }
    Ok(doctors)
}

/// Overwrite name, email, specialty and slot template. Returns rows touched.
pub fn update_doctor_profile(
    conn: &Connection,
    id: i64,
    update: &DoctorUpdate,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET name = ?1, email = ?2, specialty = ?3 WHERE id = ?4",
        params![update.name, update.email, update.specialty, id],
    )?;
    if updated > 0 {
        replace_available_times(conn, id, &update.available_times)?;
    }
    Ok(updated)
}

/// Delete a doctor row. Slot template rows cascade.
pub fn delete_doctor(conn: &Connection, id: i64) -> Result<usize, DatabaseError> {
    Ok(conn.execute("DELETE FROM doctors WHERE id = ?1", params![id])?)
}

/// Slot template in configured order.
pub fn get_available_times(conn: &Connection, doctor_id: i64) -> Result<Vec<NaiveTime>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT slot FROM doctor_available_times WHERE doctor_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![doctor_id], |row| time_column(row, 0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn replace_available_times(
    conn: &Connection,
    doctor_id: i64,
    times: &[NaiveTime],
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM doctor_available_times WHERE doctor_id = ?1",
        params![doctor_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO doctor_available_times (doctor_id, position, slot) VALUES (?1, ?2, ?3)",
    )?;
    for (position, time) in times.iter().enumerate() {
        stmt.execute(params![doctor_id, position as i64, format_time(*time)])?;
    }
    Ok(())
}
