use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::auth::AdminSession;
use shared_models::error::ApiError;
use shared_utils::jwt;

/// File-backed holder of the signed-in administrator.
///
/// The file is read once by [`SessionStore::load`]; afterwards the in-memory
/// copy is authoritative and every change is written through.
pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<AdminSession>>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.session_file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted session. A session saved without a role gets the
    /// role from its token and is written back. An expired token is treated
    /// as signed out and removed.
    pub fn load(&self) -> Result<Option<AdminSession>, ApiError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                self.set(None);
                return Ok(None);
            }
            Err(e) => return Err(ApiError::Session(format!("Failed to read session file: {}", e))),
        };

        let mut session: AdminSession = serde_json::from_str(&raw)
            .map_err(|e| ApiError::Session(format!("Corrupt session file: {}", e)))?;

        if let Ok(claims) = jwt::decode_claims(&session.token) {
            if jwt::is_expired(&claims) {
                info!("Stored session has expired; signing out");
                self.invalidate()?;
                return Ok(None);
            }
        }

        if session.role.is_none() {
            session.role = Some(jwt::role_from_token(&session.token));
            debug!("Recovered role {:?} from stored token", session.role);
            self.save(session.clone())?;
        } else {
            self.set(Some(session.clone()));
        }

        Ok(Some(session))
    }

    pub fn current(&self) -> Option<AdminSession> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|session| session.token)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    pub fn save(&self, session: AdminSession) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(&session)?;
        fs::write(&self.path, json)
            .map_err(|e| ApiError::Session(format!("Failed to write session file: {}", e)))?;
        self.set(Some(session));
        Ok(())
    }

    /// Sign out: forget the session and delete its file.
    pub fn invalidate(&self) -> Result<(), ApiError> {
        self.set(None);
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Session invalidated");
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Failed to remove session file {}: {}", self.path.display(), e);
                Err(ApiError::Session(format!("Failed to remove session file: {}", e)))
            }
        }
    }

    /// Swap in a reissued token, re-deriving the role it carries.
    pub fn rotate_token(&self, token: impl Into<String>) -> Result<AdminSession, ApiError> {
        let mut session = self
            .current()
            .ok_or_else(|| ApiError::Session("No active session to rotate".to_string()))?;

        session.token = token.into();
        session.role = Some(jwt::role_from_token(&session.token));
        self.save(session.clone())?;

        debug!("Session token rotated");
        Ok(session)
    }

    fn set(&self, session: Option<AdminSession>) {
        *self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }
}
