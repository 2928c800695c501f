//! # Slot Cell
//!
//! Appointment-slot view for one Manila civil date: two periods (morning and
//! afternoon) of numbered machine slots, the actions an administrator may take
//! on them, and the availability figures derived from them.
//!
//! ```text
//! +-----------------------------------------------------+
//! |  models.rs        |  Slot, SlotDay, view state       |
//! |  services/        |                                  |
//! |    loader.rs      |  date-keyed fetch, lazy init     |
//! |    mutation.rs    |  toggle-disable, cancel booking  |
//! |    stats.rs       |  total/available/booked/usage    |
//! |    recommendation.rs | least-loaded bucket ranking  |
//! +-----------------------------------------------------+
//! ```
//!
//! Every mutation is followed by a re-fetch of the selected day; nothing is
//! patched locally.

pub mod models;
pub mod services;

pub use models::*;
pub use services::*;
