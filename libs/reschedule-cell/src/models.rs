use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::ApiError;
use shared_utils::manila;
use slot_cell::PatientRef;

// ==============================================================================
// RESCHEDULE REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RescheduleStatus {
    Pending,
    Approved,
    Denied,
}

impl RescheduleStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RescheduleStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RescheduleStatus::Pending => "pending",
            RescheduleStatus::Approved => "approved",
            RescheduleStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for RescheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A patient's request to move an existing booking. Created by the
/// patient-facing system; only an administrator moves it out of `pending`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub patient: Option<PatientRef>,
    #[serde(default)]
    /// A bare date or an instant; projected by `original_date`.
    pub original_scheduled_date: Option<String>,
    /// Kept as sent; the backend stores it as a plain `YYYY-MM-DD` string.
    #[serde(default)]
    pub requested_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub status: RescheduleStatus,
}

impl RescheduleRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RescheduleStatus::Pending
    }

    /// The booked day being moved, as a Manila civil date.
    pub fn original_date(&self) -> Option<NaiveDate> {
        self.original_scheduled_date.as_deref().and_then(manila::parse_date)
    }

    pub fn requested_day(&self) -> Option<NaiveDate> {
        self.requested_date.as_deref().and_then(manila::parse_date)
    }

    /// `YYYY-MM-DD HH:MM` in Manila time.
    pub fn requested_at_label(&self) -> Option<String> {
        self.created_at
            .map(|at| manila::to_manila(at).format("%Y-%m-%d %H:%M").to_string())
    }

    pub fn patient_label(&self) -> String {
        self.patient
            .as_ref()
            .map(PatientRef::display_name)
            .unwrap_or_else(|| "Unknown patient".to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RescheduleListResponse {
    #[serde(default)]
    pub requests: Vec<RescheduleRequest>,
}

// ==============================================================================
// DENY FLOW
// ==============================================================================

/// The fixed set of reasons an administrator may give for denying a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DenyReason {
    #[default]
    #[serde(rename = "No available slots")]
    NoAvailableSlots,
    #[serde(rename = "Patient not eligible")]
    PatientNotEligible,
    #[serde(rename = "Schedule conflict")]
    ScheduleConflict,
    #[serde(rename = "Other")]
    Other,
}

impl DenyReason {
    pub const ALL: [DenyReason; 4] = [
        DenyReason::NoAvailableSlots,
        DenyReason::PatientNotEligible,
        DenyReason::ScheduleConflict,
        DenyReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NoAvailableSlots => "No available slots",
            DenyReason::PatientNotEligible => "Patient not eligible",
            DenyReason::ScheduleConflict => "Schedule conflict",
            DenyReason::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|reason| reason.as_str() == raw)
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A deny in progress: the request picked and the reason currently selected.
/// Starts at the first reason so a submission always carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyDraft {
    pub request_id: String,
    pub reason: DenyReason,
}

impl DenyDraft {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            reason: DenyReason::default(),
        }
    }

    pub fn with_reason(mut self, reason: DenyReason) -> Self {
        self.reason = reason;
        self
    }
}

// ==============================================================================
// QUEUE STATE
// ==============================================================================

#[derive(Debug, Clone, Default)]
pub struct QueueState {
    pub requests: Vec<RescheduleRequest>,
    pub loading: bool,
    pub error: Option<ApiError>,
    /// Message from the last successful approve or deny.
    pub notice: Option<String>,
    pub generation: u64,
}

impl QueueState {
    pub fn find(&self, request_id: &str) -> Option<&RescheduleRequest> {
        self.requests.iter().find(|request| request.id == request_id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &RescheduleRequest> {
        self.requests.iter().filter(|request| request.is_pending())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueOutcome {
    Loaded(Vec<RescheduleRequest>),
    /// Superseded by a later fetch; nothing was written.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed { message: String },
    /// The operator backed out at the confirmation step.
    Declined,
}

/// Asks the operator to confirm an action before it is sent.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> RescheduleRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn deny_reason_defaults_to_first_value() {
        assert_eq!(DenyReason::default(), DenyReason::ALL[0]);
        assert_eq!(DenyDraft::new("r1").reason.as_str(), "No available slots");
    }

    #[test]
    fn deny_reason_serializes_as_label() {
        assert_eq!(serde_json::to_value(DenyReason::ScheduleConflict).unwrap(), json!("Schedule conflict"));
        assert_eq!(DenyReason::parse("Other"), Some(DenyReason::Other));
        assert_eq!(DenyReason::parse("Because"), None);
    }

    #[test]
    fn dates_are_projected_to_manila() {
        let req = request(json!({
            "_id": "r1",
            "originalScheduledDate": "2025-01-05T17:00:00.000Z",
            "requestedDate": "2025-01-09",
            "createdAt": "2025-01-04T18:45:00.000Z",
            "status": "pending"
        }));

        assert_eq!(req.original_date(), NaiveDate::from_ymd_opt(2025, 1, 6));
        assert_eq!(req.requested_day(), NaiveDate::from_ymd_opt(2025, 1, 9));
        assert_eq!(req.requested_at_label().as_deref(), Some("2025-01-05 02:45"));
        assert_eq!(req.patient_label(), "Unknown patient");
    }

    #[test]
    fn bare_original_date_decodes() {
        let req = request(json!({
            "_id": "r2",
            "originalScheduledDate": "2025-01-06",
            "status": "pending"
        }));
        assert_eq!(req.original_date(), NaiveDate::from_ymd_opt(2025, 1, 6));

        let list: RescheduleListResponse = serde_json::from_value(json!({
            "requests": [
                { "_id": "r3", "originalScheduledDate": "2025-01-07", "status": "approved" },
                { "_id": "r4", "originalScheduledDate": "2025-01-05T16:00:00.000Z", "status": "pending" }
            ]
        })).unwrap();
        assert_eq!(list.requests.len(), 2);
        assert_eq!(list.requests[1].original_date(), NaiveDate::from_ymd_opt(2025, 1, 6));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RescheduleStatus::Pending.is_terminal());
        assert!(RescheduleStatus::Approved.is_terminal());
        assert!(RescheduleStatus::Denied.is_terminal());
    }

    #[test]
    fn missing_requests_field_is_empty() {
        let response: RescheduleListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.requests.is_empty());
    }
}
