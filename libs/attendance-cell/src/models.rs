use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_utils::manila;
use slot_cell::PatientRef;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status filter for the attendance list. `All` sends no status parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttendanceFilter {
    #[default]
    All,
    Only(AttendanceStatus),
}

impl AttendanceFilter {
    pub fn status_param(&self) -> Option<&'static str> {
        match self {
            AttendanceFilter::All => None,
            AttendanceFilter::Only(status) => Some(status.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub patient: Option<PatientRef>,
    /// `YYYY-MM-DD`, already a Manila civil date on the backend.
    pub date: String,
    pub status: AttendanceStatus,
    /// `HH:MM` check-in time, present only for `present` records.
    #[serde(default)]
    pub time: Option<String>,
}

impl AttendanceRecord {
    pub fn patient_id(&self) -> Option<&str> {
        self.patient.as_ref().map(|patient| patient.id.as_str())
    }

    pub fn day(&self) -> Option<NaiveDate> {
        manila::parse_date(&self.date)
    }

    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }

    pub fn time_label(&self) -> &str {
        match (self.status, self.time.as_deref()) {
            (AttendanceStatus::Present, Some(time)) => time,
            _ => "-",
        }
    }
}

/// Body of `POST /attendance/mark`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub patient_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_maps_to_query_parameter() {
        assert_eq!(AttendanceFilter::All.status_param(), None);
        assert_eq!(AttendanceFilter::Only(AttendanceStatus::Absent).status_param(), Some("absent"));
    }

    #[test]
    fn time_label_hides_time_for_absent_records() {
        let mut record: AttendanceRecord = serde_json::from_value(json!({
            "_id": "a1",
            "patient": { "_id": "p1", "firstName": "Ana" },
            "date": "2025-01-06",
            "status": "present",
            "time": "07:45"
        }))
        .unwrap();
        assert_eq!(record.time_label(), "07:45");
        assert_eq!(record.patient_id(), Some("p1"));

        record.status = AttendanceStatus::Absent;
        assert_eq!(record.time_label(), "-");
    }

    #[test]
    fn check_in_body_uses_backend_field_names() {
        let body = CheckIn {
            patient_id: "p1".to_string(),
            date: "2025-01-06".to_string(),
            status: AttendanceStatus::Present,
            time: "08:05".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "patientId": "p1", "date": "2025-01-06", "status": "present", "time": "08:05" })
        );
    }
}
