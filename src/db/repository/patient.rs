use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::Patient;

const PATIENT_COLUMNS: &str = "id, name, email, password_hash, phone, address";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
    })
}

/// Insert a patient. `patient.id` is ignored.
pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (name, email, password_hash, phone, address)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            patient.name,
            patient.email,
            patient.password_hash,
            patient.phone,
            patient.address,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

/// Email lookup. The column collates NOCASE, so this is case-insensitive.
pub fn find_patient_by_email(conn: &Connection, email: &str) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE email = ?1"),
            params![email],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

/// First patient matching either the email (case-insensitive) or the phone.
pub fn find_patient_by_email_or_phone(
    conn: &Connection,
    email: &str,
    phone: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!(
                "SELECT {PATIENT_COLUMNS} FROM patients
                 WHERE email = ?1 OR LOWER(phone) = LOWER(?2) LIMIT 1"
            ),
            params![email, phone],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

pub fn get_all_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id"))?;
    let rows = stmt.query_map([], patient_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
