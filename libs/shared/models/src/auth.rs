use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Admin,
    SuperAdmin,
    #[serde(other)]
    Other,
}

/// Payload of the bearer token issued by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub sub: Option<String>,
    pub email: Option<String>,
    pub role: Option<AdminRole>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

impl AdminClaims {
    pub fn subject(&self) -> Option<&str> {
        self.id.as_deref().or(self.sub.as_deref())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }
}

/// The signed-in administrator, as returned by the login endpoint plus the
/// role recovered from the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub token: String,
    #[serde(default)]
    pub role: Option<AdminRole>,
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AdminSession {
    pub fn role(&self) -> AdminRole {
        self.role.unwrap_or_default()
    }

    pub fn is_super_admin(&self) -> bool {
        self.role() == AdminRole::SuperAdmin
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role(), AdminRole::Admin | AdminRole::SuperAdmin)
    }
}
