// =====================================================================================
// INACTIVITY TIMER
// =====================================================================================

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

use shared_config::AppConfig;

/// Idle deadline that moves forward on every input event.
pub struct InactivityTimer {
    timeout: Duration,
    last_input: Mutex<Instant>,
}

impl InactivityTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_input: Mutex::new(Instant::now()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.inactivity_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record operator input.
    pub fn touch(&self) {
        *self.last_input.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_input().elapsed()
    }

    fn last_input(&self) -> Instant {
        *self.last_input.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait until the operator has been idle for the whole timeout, then call
    /// `on_timeout` once. Returns false if `shutdown` ended the wait first.
    pub async fn run<F>(&self, on_timeout: F, mut shutdown: watch::Receiver<bool>) -> bool
    where
        F: FnOnce(),
    {
        loop {
            if *shutdown.borrow() {
                return false;
            }

            let deadline = self.last_input() + self.timeout;
            if Instant::now() >= deadline {
                info!("No input for {:?}; ending session", self.timeout);
                on_timeout();
                return true;
            }

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}
