use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn, instrument};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::auth::AdminSession;
use shared_models::error::ApiError;
use shared_utils::jwt;

use crate::store::SessionStore;

#[derive(Debug, Deserialize)]
struct StatusMessage {
    #[serde(default)]
    message: Option<String>,
}

/// Admin login and password recovery against `{api}/admin`.
pub struct AuthService {
    client: BackendClient,
    store: Arc<SessionStore>,
    auth_path: String,
}

impl AuthService {
    pub fn new(config: &AppConfig, store: Arc<SessionStore>) -> Self {
        Self {
            client: BackendClient::new(config),
            store,
            auth_path: config.admin_auth_path.trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    fn path(&self, endpoint: &str) -> String {
        format!("{}{}", self.auth_path, endpoint)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminSession, ApiError> {
        debug!("Logging in admin {}", email);

        let mut session: AdminSession = self.client
            .request(
                Method::POST,
                &self.path("/login"),
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await
            .map_err(|e| match e {
                ApiError::Decode(_) => ApiError::Unauthorized("Login response did not include a token".to_string()),
                other => other,
            })?;

        if session.token.is_empty() {
            return Err(ApiError::Unauthorized("Login response did not include a token".to_string()));
        }

        session.role = Some(jwt::role_from_token(&session.token));
        self.store.save(session.clone())?;

        info!("Admin {} signed in as {:?}", email, session.role());
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.invalidate()
    }

    /// Send a one-time password to `email`.
    pub async fn request_otp(&self, email: &str) -> Result<String, ApiError> {
        self.post_for_message("/forgot-password", json!({ "email": email }), "OTP sent to your email.")
            .await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String, ApiError> {
        self.post_for_message("/verify-otp", json!({ "email": email, "otp": otp }), "OTP verified.")
            .await
    }

    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<String, ApiError> {
        self.post_for_message(
            "/reset-password",
            json!({ "email": email, "new_password": new_password }),
            "Password reset successfully.",
        )
        .await
    }

    async fn post_for_message(&self, endpoint: &str, body: serde_json::Value, fallback: &str) -> Result<String, ApiError> {
        let response: StatusMessage = self.client
            .request(Method::POST, &self.path(endpoint), None, Some(body))
            .await
            .map_err(|e| {
                warn!("{} failed: {}", endpoint, e);
                e
            })?;

        Ok(response.message.unwrap_or_else(|| fallback.to_string()))
    }
}
