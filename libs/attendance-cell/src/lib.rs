//! # Attendance Cell
//!
//! Daily check-in records for dialysis patients, keyed by Manila civil date.

pub mod models;
pub mod services;

pub use models::*;
pub use services::*;
