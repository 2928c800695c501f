use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tracing::{info, warn, instrument};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;
use shared_utils::manila;

use crate::models::{MutationOutcome, Slot};
use crate::services::loader::SlotDayLoader;

/// Slot actions. Each one is confirmed by the backend and followed by a
/// re-fetch of the selected day; the local copy is never patched.
pub struct SlotMutationService {
    client: BackendClient,
    loader: Arc<SlotDayLoader>,
    toggling: Mutex<HashSet<String>>,
    cancelling: AtomicBool,
}

/// Releases a slot's toggle control when the action finishes, however it ends.
struct ToggleGuard<'a> {
    toggling: &'a Mutex<HashSet<String>>,
    slot_id: String,
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        let mut toggling = self.toggling.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        toggling.remove(&self.slot_id);
    }
}

struct CancelGuard<'a>(&'a AtomicBool);

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SlotMutationService {
    pub fn new(config: &AppConfig, loader: Arc<SlotDayLoader>) -> Self {
        Self::with_client(BackendClient::new(config), loader)
    }

    pub fn with_client(client: BackendClient, loader: Arc<SlotDayLoader>) -> Self {
        Self {
            client,
            loader,
            toggling: Mutex::new(HashSet::new()),
            cancelling: AtomicBool::new(false),
        }
    }

    pub fn loader(&self) -> &Arc<SlotDayLoader> {
        &self.loader
    }

    /// Whether the toggle control for `slot_id` should be disabled.
    pub fn is_toggling(&self, slot_id: &str) -> bool {
        self.toggling
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(slot_id)
    }

    /// Whether every cancel control on screen should be disabled.
    pub fn is_cancelling(&self) -> bool {
        self.cancelling.load(Ordering::Acquire)
    }

    fn claim_toggle(&self, slot: &Slot) -> Result<ToggleGuard<'_>, ApiError> {
        let mut toggling = self.toggling.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !toggling.insert(slot.id.clone()) {
            return Err(ApiError::Busy(format!("Updating slot #{}", slot.slot_number)));
        }

        Ok(ToggleGuard {
            toggling: &self.toggling,
            slot_id: slot.id.clone(),
        })
    }

    fn claim_cancel(&self) -> Result<CancelGuard<'_>, ApiError> {
        self.cancelling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| CancelGuard(&self.cancelling))
            .map_err(|_| ApiError::Busy("Cancelling a booking".to_string()))
    }

    /// Manila day a booking in `slot` is held on: the slot's own date, or
    /// else the date of the loaded day it was read from. The selected date is
    /// never used since it moves as soon as a new selection starts.
    pub async fn booking_date(&self, slot: &Slot) -> Result<NaiveDate, ApiError> {
        if let Some(date) = slot.civil_date() {
            return Ok(date);
        }
        self.loader.date_of_slot(&slot.id).await.ok_or_else(|| {
            ApiError::Rejected(format!("Slot #{} is not on a loaded day", slot.slot_number))
        })
    }

    /// Flip the slot's disabled flag. A second call for the same slot while
    /// the first is in flight is refused without a request.
    #[instrument(skip(self, slot, auth_token), fields(slot_id = %slot.id))]
    pub async fn toggle_disable(&self, slot: &Slot, auth_token: &str) -> Result<MutationOutcome, ApiError> {
        let _guard = self.claim_toggle(slot)?;

        let path = format!("/appointment-slots/{}/toggle-disable", slot.id);
        self.client
            .execute(Method::POST, &path, Some(auth_token), Some(json!({})))
            .await
            .map_err(|e| {
                warn!("Failed to toggle slot #{}: {}", slot.slot_number, e);
                e
            })?;

        let message = format!(
            "Slot #{} has been {} for booking.",
            slot.slot_number,
            if slot.is_disabled { "enabled" } else { "disabled" }
        );
        info!("{}", message);

        Ok(MutationOutcome {
            message,
            refresh: self.loader.refresh(auth_token).await,
        })
    }

    /// Clear the booking held in `slot` on `date`. Refused locally, without a
    /// request, for disabled or unbooked slots and while another cancel is
    /// outstanding.
    #[instrument(skip(self, slot, auth_token), fields(slot_id = %slot.id))]
    pub async fn cancel_booking(&self, date: NaiveDate, slot: &Slot, auth_token: &str) -> Result<MutationOutcome, ApiError> {
        let patient = slot.cancellable_patient()?;
        let _guard = self.claim_cancel()?;

        self.client
            .execute(
                Method::POST,
                "/appointment-slots/cancel",
                Some(auth_token),
                Some(json!({
                    "date": manila::format_date(date),
                    "patientId": patient.id,
                })),
            )
            .await
            .map_err(|e| {
                warn!("Failed to cancel booking in slot #{}: {}", slot.slot_number, e);
                e
            })?;

        info!("Cancelled booking for patient {} in slot #{}", patient.id, slot.slot_number);

        Ok(MutationOutcome {
            message: "Booking cancelled successfully.".to_string(),
            refresh: self.loader.refresh(auth_token).await,
        })
    }
}
