//! Administrator session lifecycle: loaded once at startup, replaced on login
//! or token rotation, removed on logout or inactivity.

pub mod service;
pub mod store;

pub use service::AuthService;
pub use store::SessionStore;
