// libs/slot-cell/src/models.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use shared_models::error::ApiError;
use shared_utils::manila;

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotPeriod {
    Morning,
    Afternoon,
}

impl SlotPeriod {
    pub const ALL: [SlotPeriod; 2] = [SlotPeriod::Morning, SlotPeriod::Afternoon];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(SlotPeriod::Morning),
            "afternoon" => Some(SlotPeriod::Afternoon),
            _ => None,
        }
    }
}

impl fmt::Display for SlotPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotPeriod::Morning => write!(f, "Morning"),
            SlotPeriod::Afternoon => write!(f, "Afternoon"),
        }
    }
}

/// Outcome recorded against a booked slot. The backend also sends values such
/// as `booked`; anything other than the two terminal outcomes reads as `None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Completed,
    Cancelled,
    #[default]
    #[serde(other)]
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineRef {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub pid_number: Option<String>,
}

impl PatientRef {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        format!("{} ({})", name, self.pid_number.as_deref().unwrap_or("No PID"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(rename = "_id")]
    pub id: String,
    pub slot_number: u32,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time_slot: Option<SlotPeriod>,
    #[serde(default)]
    pub machine: Option<MachineRef>,
    #[serde(default)]
    pub is_booked: bool,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub status: SlotStatus,
    #[serde(default)]
    pub patient: Option<PatientRef>,
    #[serde(default)]
    pub booked_at: Option<DateTime<Utc>>,
}

/// Badge shown for a slot, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDisplayStatus {
    Disabled,
    Available,
    Completed,
    Cancelled,
    Booked,
}

impl fmt::Display for SlotDisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotDisplayStatus::Disabled => write!(f, "Disabled"),
            SlotDisplayStatus::Available => write!(f, "Available"),
            SlotDisplayStatus::Completed => write!(f, "Completed"),
            SlotDisplayStatus::Cancelled => write!(f, "Cancelled"),
            SlotDisplayStatus::Booked => write!(f, "Booked"),
        }
    }
}

impl Slot {
    pub fn display_status(&self) -> SlotDisplayStatus {
        if self.is_disabled {
            return SlotDisplayStatus::Disabled;
        }
        if !self.is_booked {
            return SlotDisplayStatus::Available;
        }
        match self.status {
            SlotStatus::Completed => SlotDisplayStatus::Completed,
            SlotStatus::Cancelled => SlotDisplayStatus::Cancelled,
            SlotStatus::None => SlotDisplayStatus::Booked,
        }
    }

    pub fn machine_name(&self) -> &str {
        self.machine
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or("Machine N/A")
    }

    /// Manila day the slot belongs to, read from its own `date` field.
    pub fn civil_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(manila::parse_date)
    }

    /// The booked patient, provided the booking may be cancelled.
    pub fn cancellable_patient(&self) -> Result<&PatientRef, ApiError> {
        if self.is_disabled {
            return Err(ApiError::Rejected(format!(
                "Slot #{} is disabled; enable it before cancelling its booking",
                self.slot_number
            )));
        }
        match (&self.patient, self.is_booked) {
            (Some(patient), true) => Ok(patient),
            _ => Err(ApiError::Rejected(format!(
                "Slot #{} has no booking to cancel",
                self.slot_number
            ))),
        }
    }
}

// ==============================================================================
// SLOT DAY
// ==============================================================================

/// Wire shape of `GET /appointment-slots/date/{date}`. Server-side counts are
/// ignored; statistics are always derived from the slot lists.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SlotDayResponse {
    #[serde(default)]
    pub morning: Vec<Slot>,
    #[serde(default)]
    pub afternoon: Vec<Slot>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotDay {
    /// Manila civil date this day was requested for.
    pub date: NaiveDate,
    pub morning: Vec<Slot>,
    pub afternoon: Vec<Slot>,
}

impl SlotDay {
    pub fn from_response(date: NaiveDate, response: SlotDayResponse) -> Self {
        Self {
            date,
            morning: response.morning,
            afternoon: response.afternoon,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.morning.is_empty() && self.afternoon.is_empty()
    }

    pub fn period(&self, period: SlotPeriod) -> &[Slot] {
        match period {
            SlotPeriod::Morning => &self.morning,
            SlotPeriod::Afternoon => &self.afternoon,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.morning.iter().chain(self.afternoon.iter())
    }

    pub fn find(&self, slot_id: &str) -> Option<(SlotPeriod, &Slot)> {
        SlotPeriod::ALL.iter().find_map(|period| {
            self.period(*period)
                .iter()
                .find(|slot| slot.id == slot_id)
                .map(|slot| (*period, slot))
        })
    }
}

// ==============================================================================
// VIEW STATE
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SlotViewState {
    pub selected_date: NaiveDate,
    pub day: Option<SlotDay>,
    pub error: Option<ApiError>,
    pub loading: bool,
    /// Bumped by every load; only the latest load may write this state.
    pub generation: u64,
}

impl SlotViewState {
    pub fn new(selected_date: NaiveDate) -> Self {
        Self {
            selected_date,
            day: None,
            error: None,
            loading: false,
            generation: 0,
        }
    }

    /// True when the selected date has no slots yet and the operator should be
    /// offered the "Initialize Slots" action.
    pub fn needs_initialization(&self) -> bool {
        matches!(self.error, Some(ApiError::NotInitialized(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded { day: SlotDay, initialized: bool },
    /// A newer selection was made while this load was in flight; its result
    /// was discarded.
    Stale,
}

#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub message: String,
    pub refresh: Result<LoadOutcome, ApiError>,
}

// ==============================================================================
// PATIENT ASSIGNMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DialysisSchedule {
    /// Monday, Wednesday, Friday.
    #[serde(rename = "MWF")]
    Mwf,
    /// Tuesday, Thursday, Saturday.
    #[serde(rename = "TTHS")]
    Tths,
}

impl DialysisSchedule {
    pub const ALL: [DialysisSchedule; 2] = [DialysisSchedule::Mwf, DialysisSchedule::Tths];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MWF" => Some(DialysisSchedule::Mwf),
            "TTHS" => Some(DialysisSchedule::Tths),
            _ => None,
        }
    }
}

impl fmt::Display for DialysisSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialysisSchedule::Mwf => write!(f, "MWF"),
            DialysisSchedule::Tths => write!(f, "TTHS"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub assigned_time_slot: Option<String>,
    #[serde(default)]
    pub dialysis_schedule: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl Patient {
    pub fn bucket(&self) -> Option<(SlotPeriod, DialysisSchedule)> {
        let period = self.assigned_time_slot.as_deref().and_then(SlotPeriod::parse)?;
        let schedule = self.dialysis_schedule.as_deref().and_then(DialysisSchedule::parse)?;
        Some((period, schedule))
    }
}

/// `GET /patients` answers with either a bare array or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PatientListResponse {
    Bare(Vec<Patient>),
    Wrapped { data: Vec<Patient> },
}

impl PatientListResponse {
    pub fn into_patients(self) -> Vec<Patient> {
        match self {
            PatientListResponse::Bare(patients) => patients,
            PatientListResponse::Wrapped { data } => data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationLevel {
    HighlyRecommended,
    Recommended,
    LimitedAvailability,
}

impl fmt::Display for RecommendationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationLevel::HighlyRecommended => write!(f, "Highly Recommended"),
            RecommendationLevel::Recommended => write!(f, "Recommended"),
            RecommendationLevel::LimitedAvailability => write!(f, "Limited Availability"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRecommendation {
    pub period: SlotPeriod,
    pub schedule: DialysisSchedule,
    pub assigned: u32,
    pub available: u32,
    pub level: RecommendationLevel,
}

impl AssignmentRecommendation {
    pub fn name(&self) -> String {
        format!("{} {}", self.period, self.schedule)
    }
}
