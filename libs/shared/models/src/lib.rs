pub mod auth;
pub mod error;

pub use auth::{AdminClaims, AdminRole, AdminSession};
pub use error::{ApiError, ErrorKind};
