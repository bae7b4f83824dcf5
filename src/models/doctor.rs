use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: String,
    /// Recurring daily template, in configured order.
    pub available_times: Vec<NaiveTime>,
}

/// Admin-submitted registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default)]
    pub available_times: Vec<NaiveTime>,
}

/// Fields an admin may overwrite. Password and phone are not touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorUpdate {
    pub name: String,
    pub specialty: String,
    pub email: String,
    #[serde(default)]
    pub available_times: Vec<NaiveTime>,
}
