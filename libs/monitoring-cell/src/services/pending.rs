// =====================================================================================
// PENDING APPROVALS POLLER
// =====================================================================================

use reqwest::Method;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::error::ApiError;

use crate::models::PollPolicy;

/// Number of patient and nurse accounts waiting for approval, for the
/// navigation badge. Any failure reads as zero.
pub struct PendingApprovalPoller {
    client: BackendClient,
    policy: PollPolicy,
    count: watch::Sender<usize>,
}

impl PendingApprovalPoller {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(BackendClient::new(config), PollPolicy::fixed(config.pending_poll_interval()))
    }

    pub fn with_client(client: BackendClient, policy: PollPolicy) -> Self {
        let (count, _) = watch::channel(0);
        Self { client, policy, count }
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    async fn pending(&self, path: &str, auth_token: &str) -> Result<usize, ApiError> {
        let items: Vec<Value> = self.client
            .request(Method::GET, path, Some(auth_token), None)
            .await?;
        Ok(items.len())
    }

    pub async fn poll_once(&self, auth_token: Option<&str>) -> usize {
        let count = match auth_token {
            None => 0,
            Some(token) => {
                let (patients, nurses) = futures::future::join(
                    self.pending("/approval/patients", token),
                    self.pending("/approval/nurses", token),
                )
                .await;

                match (patients, nurses) {
                    (Ok(patients), Ok(nurses)) => patients + nurses,
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Failed to fetch pending approvals: {}", e);
                        0
                    }
                }
            }
        };

        debug!("Pending approvals: {}", count);
        self.count.send_replace(count);
        count
    }

    /// Poll with whatever token `token_source` yields at each tick until
    /// `shutdown` flips to true or its sender is dropped.
    pub async fn run<F>(&self, token_source: F, mut shutdown: watch::Receiver<bool>)
    where
        F: Fn() -> Option<String>,
    {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let token = token_source();
            self.poll_once(token.as_deref()).await;

            tokio::select! {
                _ = tokio::time::sleep(self.policy.next_delay(0)) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
