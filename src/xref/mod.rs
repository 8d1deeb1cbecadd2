// Tue Jan 13 2026 - Alex

pub mod reference;

pub use reference::{MemberRef, XRef, XRefKind, XRefTarget};
