// =====================================================================================
// CONNECTIVITY HEARTBEAT
// =====================================================================================

use reqwest::Method;
use tokio::sync::watch;
use tracing::{debug, info, warn, instrument};

use shared_backend::BackendClient;
use shared_config::AppConfig;

use crate::models::{Connectivity, PollPolicy};

/// Pings a public backend endpoint and publishes whether it answered.
pub struct HeartbeatService {
    client: BackendClient,
    path: String,
    policy: PollPolicy,
    status: watch::Sender<Connectivity>,
}

impl HeartbeatService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(
            BackendClient::new(config),
            &config.heartbeat_path,
            PollPolicy::fixed(config.heartbeat_interval()),
        )
    }

    pub fn with_client(client: BackendClient, path: &str, policy: PollPolicy) -> Self {
        let (status, _) = watch::channel(Connectivity::Online);
        Self {
            client,
            path: path.to_string(),
            policy,
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.status.subscribe()
    }

    pub fn status(&self) -> Connectivity {
        *self.status.borrow()
    }

    #[instrument(skip(self))]
    pub async fn check_once(&self) -> Connectivity {
        let connectivity = match self.client.execute(Method::GET, &self.path, None, None).await {
            Ok(()) => Connectivity::Online,
            Err(e) => {
                debug!("Heartbeat to {} failed: {}", self.path, e);
                Connectivity::Offline
            }
        };

        let changed = self.status.send_if_modified(|current| {
            if *current == connectivity {
                false
            } else {
                *current = connectivity;
                true
            }
        });

        if changed {
            match connectivity {
                Connectivity::Online => info!("Backend connection restored"),
                Connectivity::Offline => warn!("Backend connection lost"),
            }
        }

        connectivity
    }

    /// Check immediately, then keep checking until `shutdown` flips to true
    /// or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut failures = 0u32;

        loop {
            if *shutdown.borrow() {
                break;
            }

            failures = match self.check_once().await {
                Connectivity::Online => 0,
                Connectivity::Offline => failures.saturating_add(1),
            };

            tokio::select! {
                _ = tokio::time::sleep(self.policy.next_delay(failures)) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("Heartbeat stopped");
    }
}
