use std::collections::HashSet;
use std::sync::Mutex;

use reqwest::Method;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn, instrument};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;

use crate::models::{AccountKind, ApprovalFetch, ApprovalState, PendingAccount};

type AccountKey = (AccountKind, String);

/// Pending patient and nurse registrations.
///
/// Actions are refused for accounts missing from the last fetched lists and
/// for an account that already has an action in flight. Success re-fetches
/// both lists; failure leaves them as they were.
pub struct ApprovalService {
    client: BackendClient,
    state: RwLock<ApprovalState>,
    acting: Mutex<HashSet<AccountKey>>,
}

struct ActionGuard<'a> {
    acting: &'a Mutex<HashSet<AccountKey>>,
    key: AccountKey,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        let mut acting = self.acting.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        acting.remove(&self.key);
    }
}

impl ApprovalService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(BackendClient::new(config))
    }

    pub fn with_client(client: BackendClient) -> Self {
        Self {
            client,
            state: RwLock::new(ApprovalState::default()),
            acting: Mutex::new(HashSet::new()),
        }
    }

    pub async fn state(&self) -> ApprovalState {
        self.state.read().await.clone()
    }

    pub fn is_acting(&self, kind: AccountKind, account_id: &str) -> bool {
        self.acting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&(kind, account_id.to_string()))
    }

    async fn list(&self, kind: AccountKind, auth_token: &str) -> Result<Vec<PendingAccount>, ApiError> {
        let accounts: Option<Vec<PendingAccount>> = self.client
            .request(Method::GET, kind.list_path(), Some(auth_token), None)
            .await?;
        Ok(accounts.unwrap_or_default())
    }

    /// Fetch both lists together. If either fails, the error is recorded and
    /// the lists already shown are kept.
    #[instrument(skip(self, auth_token))]
    pub async fn fetch(&self, auth_token: &str) -> Result<ApprovalFetch, ApiError> {
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.loading = true;
            state.generation
        };

        let (patients, nurses) = tokio::join!(
            self.list(AccountKind::Patient, auth_token),
            self.list(AccountKind::Nurse, auth_token),
        );

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("Discarding approval fetch {} (current {})", generation, state.generation);
            return Ok(ApprovalFetch::Stale);
        }
        state.loading = false;

        match (patients, nurses) {
            (Ok(patients), Ok(nurses)) => {
                debug!("Pending approvals: {} patients, {} nurses", patients.len(), nurses.len());
                let outcome = ApprovalFetch::Loaded {
                    patients: patients.len(),
                    nurses: nurses.len(),
                };
                state.patients = patients;
                state.nurses = nurses;
                state.error = None;
                Ok(outcome)
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to fetch pending approvals: {}", e);
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    #[instrument(skip(self, auth_token))]
    pub async fn approve(&self, kind: AccountKind, account_id: &str, auth_token: &str) -> Result<String, ApiError> {
        self.ensure_listed(kind, account_id).await?;
        let _guard = self.claim(kind, account_id)?;

        self.client
            .execute(Method::PUT, &kind.approve_path(account_id), Some(auth_token), Some(json!({})))
            .await
            .map_err(|e| {
                warn!("Failed to approve {} {}: {}", kind, account_id, e);
                e
            })?;

        info!("Approved {} {}", kind, account_id);
        self.refresh(auth_token).await;
        Ok(format!("The {} account has been approved.", kind))
    }

    /// Delete a registration instead of approving it.
    #[instrument(skip(self, auth_token))]
    pub async fn remove(&self, kind: AccountKind, account_id: &str, auth_token: &str) -> Result<String, ApiError> {
        self.ensure_listed(kind, account_id).await?;
        let _guard = self.claim(kind, account_id)?;

        self.client
            .execute(Method::DELETE, &kind.remove_path(account_id), Some(auth_token), None)
            .await
            .map_err(|e| {
                warn!("Failed to delete {} {}: {}", kind, account_id, e);
                e
            })?;

        info!("Removed {} {}", kind, account_id);
        self.refresh(auth_token).await;
        Ok(format!("The {} registration has been removed.", kind))
    }

    async fn ensure_listed(&self, kind: AccountKind, account_id: &str) -> Result<(), ApiError> {
        match self.state.read().await.find(kind, account_id) {
            Some(_) => Ok(()),
            None => Err(ApiError::Rejected(format!(
                "No pending {} with id {}",
                kind, account_id
            ))),
        }
    }

    fn claim(&self, kind: AccountKind, account_id: &str) -> Result<ActionGuard<'_>, ApiError> {
        let key = (kind, account_id.to_string());
        let mut acting = self.acting.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !acting.insert(key.clone()) {
            return Err(ApiError::Busy(format!("An action on {} {}", kind, account_id)));
        }
        Ok(ActionGuard { acting: &self.acting, key })
    }

    async fn refresh(&self, auth_token: &str) {
        // Failures are recorded on the state by fetch itself.
        let _ = self.fetch(auth_token).await;
    }
}
