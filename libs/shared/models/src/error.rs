use thiserror::Error;

/// How a failure should be presented to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected and actionable: offer to create the missing resource.
    NotInitialized,
    /// The server (or a client-side guard) refused the action; show the message as-is.
    Validation,
    /// Credentials missing, expired or insufficient; prompt re-login upstream.
    Auth,
    /// Anything else; the operator may retry by hand.
    Transient,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    NotInitialized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("{0} is already in progress")]
    Busy(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Session error: {0}")]
    Session(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotInitialized(_) => ErrorKind::NotInitialized,
            ApiError::Validation(_)
            | ApiError::Busy(_)
            | ApiError::Rejected(_)
            | ApiError::InvalidTransition { .. } => ErrorKind::Validation,
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => ErrorKind::Auth,
            ApiError::NotFound(_)
            | ApiError::Server { .. }
            | ApiError::Network(_)
            | ApiError::Decode(_)
            | ApiError::Session(_) => ErrorKind::Transient,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// The text shown inline next to the control that triggered the failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotInitialized(msg)
            | ApiError::Validation(msg)
            | ApiError::Rejected(msg) => msg.clone(),
            ApiError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_kinds() {
        assert_eq!(ApiError::NotInitialized("x".into()).kind(), ErrorKind::NotInitialized);
        assert_eq!(ApiError::Validation("Slot already booked".into()).kind(), ErrorKind::Validation);
        assert_eq!(ApiError::Forbidden("no".into()).kind(), ErrorKind::Auth);
        assert_eq!(ApiError::Network("reset".into()).kind(), ErrorKind::Transient);
        assert!(ApiError::Unauthorized("expired".into()).is_auth_failure());
    }

    #[test]
    fn server_messages_are_surfaced_verbatim() {
        let err = ApiError::Validation("Slot already booked".into());
        assert_eq!(err.user_message(), "Slot already booked");

        let err = ApiError::Server { status: 500, message: "Database unavailable".into() };
        assert_eq!(err.user_message(), "Database unavailable");
    }
}
