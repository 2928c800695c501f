pub mod approval;

pub use approval::ApprovalService;
