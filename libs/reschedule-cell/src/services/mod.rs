pub mod queue;
pub mod tracker;

pub use queue::RescheduleQueueService;
pub use tracker::SlotTracker;
