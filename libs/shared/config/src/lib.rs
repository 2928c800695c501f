use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub admin_auth_path: String,
    pub session_file: String,
    pub heartbeat_path: String,
    pub heartbeat_interval_secs: u64,
    pub pending_poll_interval_secs: u64,
    pub inactivity_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            admin_auth_path: "/admin".to_string(),
            session_file: ".dialysis-session.json".to_string(),
            heartbeat_path: "/machines".to_string(),
            heartbeat_interval_secs: 10,
            pending_poll_interval_secs: 60,
            inactivity_timeout_secs: 30 * 60,
            request_timeout_secs: 15,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_base_url: string_from_env("DIALYSIS_API_URL", defaults.api_base_url),
            admin_auth_path: string_from_env("DIALYSIS_ADMIN_AUTH_PATH", defaults.admin_auth_path),
            session_file: string_from_env("DIALYSIS_SESSION_FILE", defaults.session_file),
            heartbeat_path: string_from_env("DIALYSIS_HEARTBEAT_PATH", defaults.heartbeat_path),
            heartbeat_interval_secs: secs_from_env(
                "DIALYSIS_HEARTBEAT_INTERVAL_SECS",
                defaults.heartbeat_interval_secs,
            ),
            pending_poll_interval_secs: secs_from_env(
                "DIALYSIS_PENDING_POLL_INTERVAL_SECS",
                defaults.pending_poll_interval_secs,
            ),
            inactivity_timeout_secs: secs_from_env(
                "DIALYSIS_INACTIVITY_TIMEOUT_SECS",
                defaults.inactivity_timeout_secs,
            ),
            request_timeout_secs: secs_from_env(
                "DIALYSIS_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - backend URL is empty");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn pending_poll_interval(&self) -> Duration {
        Duration::from_secs(self.pending_poll_interval_secs)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn string_from_env(key: &str, default: String) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using {}", key, default);
        default
    })
}

fn secs_from_env(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} is not a whole number of seconds ({}), using {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using {}", key, default);
            default
        }
    }
}
