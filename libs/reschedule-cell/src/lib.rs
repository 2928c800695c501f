//! # Reschedule Cell
//!
//! Admin review of patient reschedule requests, and the [`SlotTracker`] that
//! puts the queue beside the selected day's slots.
//!
//! A request moves `pending -> approved` or `pending -> denied` and then
//! stays put. Both actions ask for confirmation first; deny also carries one
//! reason from [`DenyReason`].

pub mod models;
pub mod services;

pub use models::*;
pub use services::*;
