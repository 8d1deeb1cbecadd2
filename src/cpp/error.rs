// Tue Jan 20 2026 - Alex

use crate::structure::StructureError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Name collision: '{0}' already exists")]
    NameCollision(String),
    #[error("Type database error: {0}")]
    Database(#[from] StructureError),
}
