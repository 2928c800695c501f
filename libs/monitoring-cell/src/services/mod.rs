pub mod heartbeat;
pub mod inactivity;
pub mod pending;

pub use heartbeat::HeartbeatService;
pub use inactivity::InactivityTimer;
pub use pending::PendingApprovalPoller;
