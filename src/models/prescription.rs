use serde::{Deserialize, Serialize};

/// Stored prescription document. `appointment_id` is a logical reference
/// into the clinic store; nothing enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub patient_name: String,
    pub appointment_id: i64,
    pub medication: String,
    pub dosage: String,
    #[serde(default)]
    pub doctor_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrescription {
    pub patient_name: String,
    pub appointment_id: i64,
    pub medication: String,
    pub dosage: String,
    #[serde(default)]
    pub doctor_notes: Option<String>,
}
