use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;
use shared_utils::manila;
use slot_cell::{LoadOutcome, MutationOutcome, Slot, SlotDayLoader, SlotMutationService, SlotViewState};

use crate::models::{ActionOutcome, Confirmation, DenyDraft, QueueState};
use crate::services::queue::RescheduleQueueService;

/// The appointment-slot tracker screen: the selected day's slots next to the
/// reschedule queue. Approving or denying a request can change bookings, so
/// both are refreshed after either succeeds.
pub struct SlotTracker {
    loader: Arc<SlotDayLoader>,
    mutations: SlotMutationService,
    queue: RescheduleQueueService,
}

impl SlotTracker {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(BackendClient::new(config), manila::today())
    }

    pub fn with_client(client: BackendClient, date: NaiveDate) -> Self {
        let loader = Arc::new(SlotDayLoader::with_client(client.clone(), date));
        Self {
            mutations: SlotMutationService::with_client(client.clone(), loader.clone()),
            queue: RescheduleQueueService::with_client(client),
            loader,
        }
    }

    pub fn loader(&self) -> &SlotDayLoader {
        &self.loader
    }

    pub fn mutations(&self) -> &SlotMutationService {
        &self.mutations
    }

    pub fn queue(&self) -> &RescheduleQueueService {
        &self.queue
    }

    pub async fn slots(&self) -> SlotViewState {
        self.loader.state().await
    }

    pub async fn requests(&self) -> QueueState {
        self.queue.state().await
    }

    /// Load `date` and the queue together. A queue failure is recorded on the
    /// queue state and does not fail the date change.
    pub async fn select_date(&self, date: NaiveDate, auth_token: &str) -> Result<LoadOutcome, ApiError> {
        let (slots, queue) = tokio::join!(
            self.loader.select_date(date, auth_token),
            self.queue.fetch(auth_token),
        );
        if let Err(e) = queue {
            warn!("Reschedule queue unavailable: {}", e);
        }
        slots
    }

    pub async fn initialize_selected(&self, auth_token: &str) -> Result<LoadOutcome, ApiError> {
        let date = self.loader.selected_date().await;
        self.loader.initialize(date, auth_token).await
    }

    pub async fn toggle_disable(&self, slot: &Slot, auth_token: &str) -> Result<MutationOutcome, ApiError> {
        self.mutations.toggle_disable(slot, auth_token).await
    }

    /// Cancel after the operator confirms. The booking date is the slot's
    /// own day, not the current selection.
    pub async fn cancel_booking(
        &self,
        slot: &Slot,
        confirm: &dyn Confirmation,
        auth_token: &str,
    ) -> Result<Option<MutationOutcome>, ApiError> {
        slot.cancellable_patient()?;
        let date = self.mutations.booking_date(slot).await?;
        if !confirm.confirm("Are you sure you want to cancel this booking?") {
            return Ok(None);
        }
        self.mutations.cancel_booking(date, slot, auth_token).await.map(Some)
    }

    pub async fn approve(
        &self,
        request_id: &str,
        confirm: &dyn Confirmation,
        auth_token: &str,
    ) -> Result<ActionOutcome, ApiError> {
        let outcome = self.queue.approve(request_id, confirm, auth_token).await?;
        self.after_action(&outcome, auth_token).await;
        Ok(outcome)
    }

    pub async fn begin_deny(&self, request_id: &str) -> Result<DenyDraft, ApiError> {
        self.queue.begin_deny(request_id).await
    }

    pub async fn submit_deny(
        &self,
        draft: &DenyDraft,
        confirm: &dyn Confirmation,
        auth_token: &str,
    ) -> Result<ActionOutcome, ApiError> {
        let outcome = self.queue.submit_deny(draft, confirm, auth_token).await?;
        self.after_action(&outcome, auth_token).await;
        Ok(outcome)
    }

    /// The queue has already been re-fetched by the action itself; this
    /// reloads the displayed day. The affected booking may be on another date.
    async fn after_action(&self, outcome: &ActionOutcome, auth_token: &str) {
        if let ActionOutcome::Completed { message } = outcome {
            info!("{}", message);
            if let Err(e) = self.loader.refresh(auth_token).await {
                warn!("Slot day refresh after reschedule action failed: {}", e);
            }
        }
    }
}

