use std::time::Duration;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::error::ApiError;

/// REST client for the dialysis-center backend. Every call carries the
/// admin's bearer token when one is supplied; nothing is retried.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::Unauthorized("Bearer token contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        query: &[(&str, String)],
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method, &url)
            .headers(headers)
            .timeout(self.timeout);

        if !query.is_empty() {
            req = req.query(query);
        }

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);
            return Err(status_error(status, &error_text));
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, ApiError>
    where T: DeserializeOwned {
        self.request_with_query(method, path, auth_token, body, &[]).await
    }

    pub async fn request_with_query<T>(&self, method: Method, path: &str,
                                       auth_token: Option<&str>, body: Option<Value>,
                                       query: &[(&str, String)])
                                       -> Result<T, ApiError>
    where T: DeserializeOwned {
        let response = self.send(method, path, auth_token, body, query).await?;

        let text = response.text().await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        serde_json::from_str::<T>(&text).map_err(|e| {
            error!("Failed to decode response from {}: {}", path, e);
            ApiError::Decode(e.to_string())
        })
    }

    /// Fires a command whose response body is irrelevant to the caller.
    pub async fn execute(&self, method: Method, path: &str,
                         auth_token: Option<&str>, body: Option<Value>)
                         -> Result<(), ApiError> {
        self.send(method, path, auth_token, body, &[]).await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Maps a non-success status onto the error taxonomy, preferring the server's
/// own `message` (or `error`) field over the raw body.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = server_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    match status.as_u16() {
        401 => ApiError::Unauthorized(message),
        403 => ApiError::Forbidden(message),
        404 => ApiError::NotFound(message),
        400 | 409 | 422 => ApiError::Validation(message),
        code => ApiError::Server { status: code, message },
    }
}

fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => ["message", "error"]
            .iter()
            .find_map(|key| json.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}
