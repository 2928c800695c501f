use std::sync::Arc;
use chrono::{Duration, Utc};
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AdminRole, AdminSession};

pub struct TestConfig {
    pub api_base_url: String,
    pub session_file: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            session_file: ".test-session.json".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            session_file: self.session_file.clone(),
            request_timeout_secs: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Backend ids are 24-character hex object ids.
pub fn object_id() -> String {
    Uuid::new_v4().simple().to_string()[..24].to_string()
}

pub struct TestAdmin {
    pub id: String,
    pub email: String,
    pub role: AdminRole,
}

impl Default for TestAdmin {
    fn default() -> Self {
        Self {
            id: object_id(),
            email: "admin@clinic.ph".to_string(),
            role: AdminRole::Admin,
        }
    }
}

impl TestAdmin {
    pub fn new(email: &str, role: AdminRole) -> Self {
        Self {
            id: object_id(),
            email: email.to_string(),
            role,
        }
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, AdminRole::Admin)
    }

    pub fn super_admin(email: &str) -> Self {
        Self::new(email, AdminRole::SuperAdmin)
    }

    pub fn to_session(&self) -> AdminSession {
        AdminSession {
            token: JwtTestUtils::create_test_token(self, Some(24)),
            role: Some(self.role),
            admin_id: Some(self.id.clone()),
            email: Some(self.email.clone()),
            name: Some("Test Admin".to_string()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    fn encode(payload: &Value) -> String {
        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode("test-signature");
        format!("{}.{}.{}", header_encoded, payload_encoded, signature_encoded)
    }

    pub fn create_test_token(admin: &TestAdmin, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        Self::encode(&json!({
            "id": admin.id,
            "email": admin.email,
            "role": admin.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        }))
    }

    pub fn create_token_without_role(admin_id: &str) -> String {
        Self::encode(&json!({
            "id": admin_id,
            "iat": Utc::now().timestamp()
        }))
    }

    pub fn create_expired_token(admin: &TestAdmin) -> String {
        Self::create_test_token(admin, Some(-1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn slot(slot_number: u32, time_slot: &str, date: &str) -> Value {
        json!({
            "_id": object_id(),
            "date": date,
            "timeSlot": time_slot,
            "slotNumber": slot_number,
            "machine": { "_id": object_id(), "name": format!("Machine {}", slot_number) },
            "isBooked": false,
            "isDisabled": false,
            "patient": null,
            "bookedAt": null
        })
    }

    pub fn booked_slot(slot_number: u32, time_slot: &str, date: &str, patient_id: &str) -> Value {
        let mut slot = Self::slot(slot_number, time_slot, date);
        slot["isBooked"] = json!(true);
        slot["status"] = json!("booked");
        slot["bookedAt"] = json!("2025-01-03T01:15:00.000Z");
        slot["patient"] = Self::patient_ref(patient_id);
        slot
    }

    pub fn disabled_slot(slot_number: u32, time_slot: &str, date: &str) -> Value {
        let mut slot = Self::slot(slot_number, time_slot, date);
        slot["isDisabled"] = json!(true);
        slot
    }

    pub fn patient_ref(patient_id: &str) -> Value {
        json!({
            "_id": patient_id,
            "firstName": "Juan",
            "lastName": "Dela Cruz",
            "pidNumber": "PID-0042"
        })
    }

    /// A day of `per_period` slots in each period with the first `booked`
    /// slots (morning first) taken.
    pub fn slot_day(date: &str, per_period: u32, booked: u32) -> Value {
        let mut remaining = booked;
        let mut period = |time_slot: &str| -> Vec<Value> {
            (1..=per_period)
                .map(|n| {
                    if remaining > 0 {
                        remaining -= 1;
                        Self::booked_slot(n, time_slot, date, &object_id())
                    } else {
                        Self::slot(n, time_slot, date)
                    }
                })
                .collect()
        };
        let morning = period("morning");
        let afternoon = period("afternoon");
        Self::slot_day_with(date, morning, afternoon)
    }

    pub fn slot_day_with(date: &str, morning: Vec<Value>, afternoon: Vec<Value>) -> Value {
        let total = morning.len() + afternoon.len();
        let booked = morning
            .iter()
            .chain(afternoon.iter())
            .filter(|slot| slot["isBooked"] == json!(true))
            .count();
        json!({
            "date": date,
            "morning": morning,
            "afternoon": afternoon,
            "totalSlots": total,
            "availableSlots": total - booked,
            "bookedSlots": booked
        })
    }

    pub fn empty_slot_day(date: &str) -> Value {
        Self::slot_day_with(date, Vec::new(), Vec::new())
    }

    pub fn reschedule_request(request_id: &str, status: &str) -> Value {
        json!({
            "_id": request_id,
            "patient": Self::patient_ref(&object_id()),
            "originalScheduledDate": "2025-01-06T00:00:00.000Z",
            "requestedDate": "2025-01-08",
            "createdAt": "2025-01-04T02:30:00.000Z",
            "status": status
        })
    }

    pub fn reschedule_requests(requests: Vec<Value>) -> Value {
        json!({ "requests": requests })
    }

    pub fn patient(time_slot: &str, schedule: &str, archived: bool) -> Value {
        json!({
            "_id": object_id(),
            "firstName": "Maria",
            "lastName": "Santos",
            "assignedTimeSlot": time_slot,
            "dialysisSchedule": schedule,
            "archived": archived
        })
    }

    pub fn attendance_record(record_id: &str, patient_id: &str, date: &str, status: &str) -> Value {
        let time = if status == "present" { json!("07:30") } else { Value::Null };
        json!({
            "_id": record_id,
            "patient": Self::patient_ref(patient_id),
            "date": date,
            "status": status,
            "time": time
        })
    }

    pub fn login_response(token: &str) -> Value {
        json!({
            "_id": object_id(),
            "name": "Test Admin",
            "email": "admin@clinic.ph",
            "token": token
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "message": message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_base_url("http://127.0.0.1:4010");
        let app_config = config.to_app_config();

        assert_eq!(app_config.api_base_url, "http://127.0.0.1:4010");
        assert_eq!(app_config.request_timeout_secs, 5);
    }

    #[test]
    fn test_slot_day_fixture_counts() {
        let day = MockBackendResponses::slot_day("2025-01-06", 5, 3);
        assert_eq!(day["totalSlots"], 10);
        assert_eq!(day["bookedSlots"], 3);
        assert_eq!(day["morning"][2]["isBooked"], true);
        assert_eq!(day["morning"][3]["isBooked"], false);
    }

    #[test]
    fn test_object_id_shape() {
        let id = object_id();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
