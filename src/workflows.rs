//! Use cases that span more than one service.

use rusqlite::Connection;

use crate::appointments::{self, StatusChange};
use crate::crypto::TokenService;
use crate::models::{NewPrescription, STATUS_COMPLETED};
use crate::prescriptions::{self, SavePrescriptionOutcome};

/// Save a prescription and, once stored, mark its appointment completed on
/// behalf of the prescribing doctor. The status flip follows the usual
/// ownership rule and is skipped silently for a non-owning doctor.
pub fn issue_prescription(
    clinic: &Connection,
    prescription_store: &Connection,
    tokens: &TokenService,
    prescription: &NewPrescription,
    token: &str,
) -> SavePrescriptionOutcome {
    let outcome = prescriptions::save(prescription_store, prescription);
    if let SavePrescriptionOutcome::Saved { .. } = outcome {
        let change = appointments::change_status(
            clinic,
            tokens,
            prescription.appointment_id,
            STATUS_COMPLETED,
            token,
        );
        if change != StatusChange::Applied {
            tracing::warn!(
                appointment_id = prescription.appointment_id,
                ?change,
                "Prescription saved but appointment status unchanged"
            );
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::prescription_db::open_memory_prescription_database;
    use crate::db::repository::{get_appointment, insert_appointment, insert_doctor, insert_patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Doctor, Patient, STATUS_SCHEDULED};
    use chrono::NaiveDateTime;

    fn setup() -> (Connection, Connection, TokenService, i64) {
        let clinic = open_memory_database().unwrap();
        let doctor = insert_doctor(&clinic, &Doctor {
            id: 0,
            name: "Dr. Smith".into(),
            specialty: "Cardiology".into(),
            email: "smith@clinic.test".into(),
            password_hash: "hash".into(),
            phone: "5550001111".into(),
            available_times: vec![],
        })
        .unwrap();
        insert_doctor(&clinic, &Doctor {
            id: 0,
            name: "Dr. Jones".into(),
            specialty: "Neurology".into(),
            email: "jones@clinic.test".into(),
            password_hash: "hash".into(),
            phone: "5550004444".into(),
            available_times: vec![],
        })
        .unwrap();
        let patient = insert_patient(&clinic, &Patient {
            id: 0,
            name: "Alice Martin".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            phone: "5550002222".into(),
            address: "1 Main St".into(),
        })
        .unwrap();
        let time = NaiveDateTime::parse_from_str("2030-01-10 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let appointment = insert_appointment(&clinic, doctor, patient, time, STATUS_SCHEDULED).unwrap();
        let tokens = TokenService::new(b"test-secret-0123456789-abcdefghijklmnop", 60_000);
        (clinic, open_memory_prescription_database().unwrap(), tokens, appointment)
    }

    fn rx(appointment_id: i64) -> NewPrescription {
        NewPrescription {
            patient_name: "Alice Martin".into(),
            appointment_id,
            medication: "Amoxicillin".into(),
            dosage: "500mg".into(),
            doctor_notes: None,
        }
    }

    #[test]
    fn issuing_completes_the_appointment() {
        let (clinic, store, tokens, appointment) = setup();
        let token = tokens.issue("smith@clinic.test").unwrap();

        let outcome = issue_prescription(&clinic, &store, &tokens, &rx(appointment), &token);
        assert!(matches!(outcome, SavePrescriptionOutcome::Saved { .. }));
        assert_eq!(get_appointment(&clinic, appointment).unwrap().unwrap().status, STATUS_COMPLETED);
    }

    #[test]
    fn duplicate_leaves_status_alone() {
        let (clinic, store, tokens, appointment) = setup();
        let token = tokens.issue("smith@clinic.test").unwrap();
        issue_prescription(&clinic, &store, &tokens, &rx(appointment), &token);

        // Reset so a second flip would be visible
        crate::db::repository::update_appointment_status(&clinic, appointment, STATUS_SCHEDULED).unwrap();
        let again = issue_prescription(&clinic, &store, &tokens, &rx(appointment), &token);
        assert_eq!(again, SavePrescriptionOutcome::AlreadyExists);
        assert_eq!(get_appointment(&clinic, appointment).unwrap().unwrap().status, STATUS_SCHEDULED);
    }

    #[test]
    fn other_doctor_saves_but_cannot_complete() {
        let (clinic, store, tokens, appointment) = setup();
        let token = tokens.issue("jones@clinic.test").unwrap();
        let outcome = issue_prescription(&clinic, &store, &tokens, &rx(appointment), &token);
        assert!(matches!(outcome, SavePrescriptionOutcome::Saved { .. }));
        assert_eq!(get_appointment(&clinic, appointment).unwrap().unwrap().status, STATUS_SCHEDULED);
    }
}
