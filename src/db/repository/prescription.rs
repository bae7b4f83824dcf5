use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Prescription;

/// Store a prescription document under its id.
pub fn insert_prescription(conn: &Connection, prescription: &Prescription) -> Result<(), DatabaseError> {
    let document = serde_json::to_string(prescription)?;
    conn.execute(
        "INSERT INTO prescriptions (id, appointment_id, document) VALUES (?1, ?2, ?3)",
        params![prescription.id, prescription.appointment_id, document],
    )?;
    Ok(())
}

pub fn prescription_exists_for_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM prescriptions WHERE appointment_id = ?1 LIMIT 1",
            params![appointment_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn find_prescriptions_by_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT document FROM prescriptions WHERE appointment_id = ?1 ORDER BY created_at, id",
    )?;
    let documents = stmt.query_map(params![appointment_id], |row| row.get::<_, String>(0))?;

    let mut prescriptions = Vec::new();
    for document in documents {
        prescriptions.push(serde_json::from_str(&document?)?);
    }
    Ok(prescriptions)
}
