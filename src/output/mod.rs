// Tue Jan 13 2026 - Alex

pub mod formatter;

pub use formatter::DeclFormatter;
