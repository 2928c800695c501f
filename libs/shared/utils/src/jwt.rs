use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use tracing::debug;
use shared_models::auth::{AdminClaims, AdminRole};
use shared_models::error::ApiError;

/// Reads the claims segment of a backend-issued token.
///
/// The signature is not checked here: tokens are issued and verified by the
/// backend, the console only needs the role and expiry they carry.
pub fn decode_claims(token: &str) -> Result<AdminClaims, ApiError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ApiError::Session("Invalid token format".to_string()));
    }

    // Some issuers pad the segment; the URL-safe engine rejects padding.
    let claims_b64 = parts[1].trim_end_matches('=');

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err(ApiError::Session("Invalid claims encoding".to_string())),
        },
        Err(e) => {
            debug!("Failed to decode token claims: {}", e);
            return Err(ApiError::Session("Invalid claims encoding".to_string()));
        }
    };

    serde_json::from_str::<AdminClaims>(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        ApiError::Session("Invalid claims format".to_string())
    })
}

/// Role carried by the token, `admin` when the token has none or cannot be read.
pub fn role_from_token(token: &str) -> AdminRole {
    decode_claims(token)
        .ok()
        .and_then(|claims| claims.role)
        .unwrap_or_default()
}

pub fn is_expired(claims: &AdminClaims) -> bool {
    match claims.exp {
        Some(exp) => exp < Utc::now().timestamp(),
        None => false,
    }
}
