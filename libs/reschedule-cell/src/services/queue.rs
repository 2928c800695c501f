use std::collections::HashSet;
use std::sync::Mutex;

use reqwest::Method;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn, instrument};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;

use crate::models::{
    ActionOutcome, Confirmation, DenyDraft, QueueOutcome, QueueState, RescheduleListResponse,
    RescheduleRequest, RescheduleStatus,
};

pub const APPROVE_PROMPT: &str = "Approve this reschedule request?";
pub const DENY_PROMPT: &str = "Deny this reschedule request?";

/// Admin review queue for reschedule requests.
///
/// Approve and deny are only sent for requests the last fetched snapshot
/// shows as pending, and a request already being acted on is refused before
/// the operator is asked again. Success re-fetches the queue; failure leaves it as it
/// was so the action can be retried.
pub struct RescheduleQueueService {
    client: BackendClient,
    state: RwLock<QueueState>,
    acting: Mutex<HashSet<String>>,
}

struct ActionGuard<'a> {
    acting: &'a Mutex<HashSet<String>>,
    request_id: String,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        let mut acting = self.acting.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        acting.remove(&self.request_id);
    }
}

impl RescheduleQueueService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(BackendClient::new(config))
    }

    pub fn with_client(client: BackendClient) -> Self {
        Self {
            client,
            state: RwLock::new(QueueState::default()),
            acting: Mutex::new(HashSet::new()),
        }
    }

    pub async fn state(&self) -> QueueState {
        self.state.read().await.clone()
    }

    pub fn is_acting(&self, request_id: &str) -> bool {
        self.acting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(request_id)
    }

    /// Fetch every request regardless of status. A fetch overtaken by a later
    /// one is discarded.
    #[instrument(skip(self, auth_token))]
    pub async fn fetch(&self, auth_token: &str) -> Result<QueueOutcome, ApiError> {
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.loading = true;
            state.generation
        };

        let result = self.client
            .request::<RescheduleListResponse>(
                Method::GET,
                "/appointment-slots/reschedule-requests",
                Some(auth_token),
                None,
            )
            .await
            .map(|response| response.requests);

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("Discarding reschedule queue fetch {} (current {})", generation, state.generation);
            return Ok(QueueOutcome::Stale);
        }
        state.loading = false;

        match result {
            Ok(requests) => {
                debug!("Fetched {} reschedule requests", requests.len());
                state.requests = requests.clone();
                state.error = None;
                Ok(QueueOutcome::Loaded(requests))
            }
            Err(e) => {
                warn!("Failed to fetch reschedule requests: {}", e);
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Approve a pending request once the operator confirms.
    #[instrument(skip(self, confirm, auth_token))]
    pub async fn approve(
        &self,
        request_id: &str,
        confirm: &dyn Confirmation,
        auth_token: &str,
    ) -> Result<ActionOutcome, ApiError> {
        self.ensure_pending(request_id, RescheduleStatus::Approved).await?;
        let _guard = self.claim(request_id)?;

        if !confirm.confirm(APPROVE_PROMPT) {
            debug!("Approval of {} declined by operator", request_id);
            return Ok(ActionOutcome::Declined);
        }

        let path = format!("/appointment-slots/reschedule-requests/{}/approve", request_id);
        self.client
            .execute(Method::POST, &path, Some(auth_token), Some(json!({})))
            .await
            .map_err(|e| {
                warn!("Failed to approve reschedule request {}: {}", request_id, e);
                e
            })?;

        info!("Approved reschedule request {}", request_id);
        Ok(self.complete("Request approved and slot updated.", auth_token).await)
    }

    /// Start the deny flow for a pending request. The draft carries the
    /// default reason until the operator picks another.
    pub async fn begin_deny(&self, request_id: &str) -> Result<DenyDraft, ApiError> {
        self.ensure_pending(request_id, RescheduleStatus::Denied).await?;
        Ok(DenyDraft::new(request_id))
    }

    #[instrument(skip(self, confirm, auth_token), fields(request_id = %draft.request_id))]
    pub async fn submit_deny(
        &self,
        draft: &DenyDraft,
        confirm: &dyn Confirmation,
        auth_token: &str,
    ) -> Result<ActionOutcome, ApiError> {
        self.ensure_pending(&draft.request_id, RescheduleStatus::Denied).await?;
        let _guard = self.claim(&draft.request_id)?;

        if !confirm.confirm(DENY_PROMPT) {
            debug!("Denial of {} declined by operator", draft.request_id);
            return Ok(ActionOutcome::Declined);
        }

        let path = format!("/appointment-slots/reschedule-requests/{}/deny", draft.request_id);
        self.client
            .execute(
                Method::POST,
                &path,
                Some(auth_token),
                Some(json!({ "reason": draft.reason })),
            )
            .await
            .map_err(|e| {
                warn!("Failed to deny reschedule request {}: {}", draft.request_id, e);
                e
            })?;

        info!("Denied reschedule request {} ({})", draft.request_id, draft.reason);
        Ok(self.complete("Request denied.", auth_token).await)
    }

    async fn ensure_pending(&self, request_id: &str, target: RescheduleStatus) -> Result<RescheduleRequest, ApiError> {
        let state = self.state.read().await;
        let request = state
            .find(request_id)
            .ok_or_else(|| ApiError::Rejected(format!("Reschedule request {} is not in the queue", request_id)))?;

        if request.status.is_terminal() {
            return Err(ApiError::InvalidTransition {
                from: request.status.to_string(),
                to: target.to_string(),
            });
        }

        Ok(request.clone())
    }

    fn claim(&self, request_id: &str) -> Result<ActionGuard<'_>, ApiError> {
        let mut acting = self.acting.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !acting.insert(request_id.to_string()) {
            return Err(ApiError::Busy(format!("An action on request {}", request_id)));
        }
        Ok(ActionGuard {
            acting: &self.acting,
            request_id: request_id.to_string(),
        })
    }

    async fn complete(&self, message: &str, auth_token: &str) -> ActionOutcome {
        // Refresh failures are recorded on the state by fetch itself.
        let _ = self.fetch(auth_token).await;
        self.state.write().await.notice = Some(message.to_string());
        ActionOutcome::Completed { message: message.to_string() }
    }
}
