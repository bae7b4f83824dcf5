//! Prescriptions live in their own store and reference appointments by id
//! only. At most one prescription exists per appointment.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    find_prescriptions_by_appointment, insert_prescription, prescription_exists_for_appointment,
};
use crate::db::DatabaseError;
use crate::models::{NewPrescription, Prescription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavePrescriptionOutcome {
    Saved { id: String },
    AlreadyExists,
    Failed,
}

pub fn save(conn: &Connection, prescription: &NewPrescription) -> SavePrescriptionOutcome {
    match try_save(conn, prescription) {
        Ok(outcome) => {
            if let SavePrescriptionOutcome::Saved { id } = &outcome {
                tracing::info!(
                    prescription_id = %id,
                    appointment_id = prescription.appointment_id,
                    "Prescription saved"
                );
            }
            outcome
        }
        Err(e) => {
            tracing::error!(error = %e, "Prescription save failed");
            SavePrescriptionOutcome::Failed
        }
    }
}

fn try_save(conn: &Connection, prescription: &NewPrescription) -> Result<SavePrescriptionOutcome, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    if prescription_exists_for_appointment(&tx, prescription.appointment_id)? {
        return Ok(SavePrescriptionOutcome::AlreadyExists);
    }
    let stored = Prescription {
        id: Uuid::new_v4().to_string(),
        patient_name: prescription.patient_name.clone(),
        appointment_id: prescription.appointment_id,
        medication: prescription.medication.clone(),
        dosage: prescription.dosage.clone(),
        doctor_notes: prescription.doctor_notes.clone(),
    };
    insert_prescription(&tx, &stored)?;
    tx.commit()?;
    Ok(SavePrescriptionOutcome::Saved { id: stored.id })
}

pub fn get_by_appointment(conn: &Connection, appointment_id: i64) -> Result<Vec<Prescription>, DatabaseError> {
    find_prescriptions_by_appointment(conn, appointment_id)
}
