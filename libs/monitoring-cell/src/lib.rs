// =====================================================================================
// MONITORING CELL - CONNECTIVITY, NOTIFICATIONS & IDLE LOGOUT
// =====================================================================================
//
// Background activities that run beside the console:
// - Connectivity heartbeat against a public backend endpoint
// - Pending approval count for the navigation badge
// - Inactivity timer that ends the session after a quiet period
//
// Intervals and backoff come from `PollPolicy` so each can be tested alone.
//
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{Backoff, Connectivity, PollPolicy};

pub use services::{HeartbeatService, InactivityTimer, PendingApprovalPoller};
