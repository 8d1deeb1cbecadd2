// Tue Jan 13 2026 - Alex

pub mod session;

pub use session::{Session, SessionError};
