use chrono::NaiveTime;

use super::enums::VisitCondition;

/// Doctor directory search. Every field is optional; `None` matches all.
#[derive(Debug, Default, Clone)]
pub struct DoctorFilter {
    /// Case-insensitive substring of the doctor's name.
    pub name: Option<String>,
    /// Case-insensitive exact specialty.
    pub specialty: Option<String>,
    /// Slot that must appear in the doctor's daily template.
    pub time: Option<NaiveTime>,
}

/// Patient-side appointment search.
#[derive(Debug, Default, Clone)]
pub struct PatientAppointmentFilter {
    pub condition: Option<VisitCondition>,
    /// Case-insensitive substring of the doctor's name.
    pub doctor_name: Option<String>,
}
