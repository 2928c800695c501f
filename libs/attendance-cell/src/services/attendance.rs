use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use tracing::{debug, info, warn, instrument};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;
use shared_utils::manila;

use crate::models::{AttendanceFilter, AttendanceRecord, AttendanceStatus, CheckIn};

pub struct AttendanceService {
    client: BackendClient,
}

impl AttendanceService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(BackendClient::new(config))
    }

    pub fn with_client(client: BackendClient) -> Self {
        Self { client }
    }

    /// Records for `date` (every date when `None`) narrowed by `filter`.
    #[instrument(skip(self, auth_token))]
    pub async fn list(
        &self,
        date: Option<NaiveDate>,
        filter: AttendanceFilter,
        auth_token: &str,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        let mut query = Vec::new();
        if let Some(date) = date {
            query.push(("date", manila::format_date(date)));
        }
        if let Some(status) = filter.status_param() {
            query.push(("status", status.to_string()));
        }

        let records: Vec<AttendanceRecord> = self.client
            .request_with_query(Method::GET, "/attendance", Some(auth_token), None, &query)
            .await?;

        debug!("Fetched {} attendance records", records.len());
        Ok(records)
    }

    /// Today's records in Manila.
    pub async fn today(&self, auth_token: &str) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.list(Some(manila::today()), AttendanceFilter::All, auth_token).await
    }

    pub async fn mark_present(&self, patient_id: &str, auth_token: &str) -> Result<String, ApiError> {
        self.mark_present_at(patient_id, Utc::now(), auth_token).await
    }

    /// Check a patient in as present at `now`, stamped with the Manila date
    /// and `HH:MM` clock time.
    #[instrument(skip(self, auth_token))]
    pub async fn mark_present_at(
        &self,
        patient_id: &str,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<String, ApiError> {
        let check_in = CheckIn {
            patient_id: patient_id.to_string(),
            date: manila::format_date(manila::civil_date(now)),
            status: AttendanceStatus::Present,
            time: manila::clock_time(now),
        };
        let body = serde_json::to_value(&check_in)?;

        self.client
            .execute(Method::POST, "/attendance/mark", Some(auth_token), Some(body))
            .await
            .map_err(|e| {
                warn!("Failed to check in patient {}: {}", patient_id, e);
                e
            })?;

        info!("Checked in patient {} on {} at {}", patient_id, check_in.date, check_in.time);
        Ok("Patient checked in successfully.".to_string())
    }

    #[instrument(skip(self, auth_token))]
    pub async fn cancel_check_in(&self, attendance_id: &str, auth_token: &str) -> Result<String, ApiError> {
        let path = format!("/attendance/{}", attendance_id);
        self.client
            .execute(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| {
                warn!("Failed to cancel check-in {}: {}", attendance_id, e);
                e
            })?;

        info!("Cancelled check-in {}", attendance_id);
        Ok("Check-in cancelled successfully.".to_string())
    }
}

/// The record for `patient_id` on `date`, if one exists.
pub fn find_for_patient<'a>(
    records: &'a [AttendanceRecord],
    patient_id: &str,
    date: NaiveDate,
) -> Option<&'a AttendanceRecord> {
    records
        .iter()
        .find(|record| record.patient_id() == Some(patient_id) && record.day() == Some(date))
}

/// Latest status per patient; a later record for the same patient wins.
pub fn status_by_patient(records: &[AttendanceRecord]) -> HashMap<String, AttendanceStatus> {
    records
        .iter()
        .filter_map(|record| record.patient_id().map(|id| (id.to_string(), record.status)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, patient_id: &str, date: &str, status: &str) -> AttendanceRecord {
        serde_json::from_value(json!({
            "_id": id,
            "patient": { "_id": patient_id },
            "date": date,
            "status": status
        }))
        .unwrap()
    }

    #[test]
    fn find_matches_patient_and_day() {
        let records = vec![
            record("a1", "p1", "2025-01-05", "present"),
            record("a2", "p1", "2025-01-06", "present"),
            record("a3", "p2", "2025-01-06", "absent"),
        ];
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        assert_eq!(find_for_patient(&records, "p1", day).map(|r| r.id.as_str()), Some("a2"));
        assert!(find_for_patient(&records, "p3", day).is_none());
    }

    #[test]
    fn later_records_win_in_status_map() {
        let records = vec![
            record("a1", "p1", "2025-01-06", "absent"),
            record("a2", "p1", "2025-01-06", "present"),
        ];
        assert_eq!(status_by_patient(&records).get("p1"), Some(&AttendanceStatus::Present));
    }
}
