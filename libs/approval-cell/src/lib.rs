//! # Approval Cell
//!
//! Patient and nurse registrations waiting for an administrator. Each one is
//! either approved or removed; both actions re-fetch the pending lists.

pub mod models;
pub mod services;

pub use models::*;
pub use services::*;
