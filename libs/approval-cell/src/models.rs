use serde::{Deserialize, Serialize};
use std::fmt;

use shared_models::error::ApiError;

// ==============================================================================
// ACCOUNT MODELS
// ==============================================================================

/// Kind of registration awaiting approval. Lists are read from the plural
/// collection; actions address the singular one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Patient,
    Nurse,
}

impl AccountKind {
    pub const ALL: [AccountKind; 2] = [AccountKind::Patient, AccountKind::Nurse];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "patient" | "patients" => Some(AccountKind::Patient),
            "nurse" | "nurses" => Some(AccountKind::Nurse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Patient => "patient",
            AccountKind::Nurse => "nurse",
        }
    }

    pub fn list_path(&self) -> &'static str {
        match self {
            AccountKind::Patient => "/approval/patients",
            AccountKind::Nurse => "/approval/nurses",
        }
    }

    pub fn approve_path(&self, account_id: &str) -> String {
        format!("/approval/{}/{}/approve", self.as_str(), account_id)
    }

    pub fn remove_path(&self, account_id: &str) -> String {
        format!("/approval/{}/{}", self.as_str(), account_id)
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingAccount {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl PendingAccount {
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ==============================================================================
// VIEW STATE
// ==============================================================================

#[derive(Debug, Clone, Default)]
pub struct ApprovalState {
    pub patients: Vec<PendingAccount>,
    pub nurses: Vec<PendingAccount>,
    pub loading: bool,
    pub error: Option<ApiError>,
    pub generation: u64,
}

impl ApprovalState {
    pub fn accounts(&self, kind: AccountKind) -> &[PendingAccount] {
        match kind {
            AccountKind::Patient => &self.patients,
            AccountKind::Nurse => &self.nurses,
        }
    }

    pub fn find(&self, kind: AccountKind, account_id: &str) -> Option<&PendingAccount> {
        self.accounts(kind).iter().find(|account| account.id == account_id)
    }

    /// Count shown on the navigation badge.
    pub fn total(&self) -> usize {
        self.patients.len() + self.nurses.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalFetch {
    Loaded { patients: usize, nurses: usize },
    /// Overtaken by a later fetch; nothing was written.
    Stale,
}
