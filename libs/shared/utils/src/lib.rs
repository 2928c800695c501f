pub mod jwt;
pub mod manila;
pub mod test_utils;
