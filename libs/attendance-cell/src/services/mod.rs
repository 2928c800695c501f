pub mod attendance;

pub use attendance::{find_for_patient, status_by_patient, AttendanceService};
