pub mod loader;
pub mod mutation;
pub mod recommendation;
pub mod stats;

pub use loader::SlotDayLoader;
pub use mutation::SlotMutationService;
pub use recommendation::AssignmentRecommendationService;
pub use stats::SlotStats;
