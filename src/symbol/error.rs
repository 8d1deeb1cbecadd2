// Tue Jan 13 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Symbol not found at {0:#x}")]
    NotFound(u64),
    #[error("Name '{name}' already used at {existing:#x}")]
    NameCollision { name: String, existing: u64 },
    #[error("Invalid name: '{0}'")]
    InvalidName(String),
}
