// Tue Jan 13 2026 - Alex

use crate::symbol::SymbolError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Struct not found: {0}")]
    StructNotFound(String),
    #[error("Member not found: {struct_name}+{offset:#x}")]
    MemberNotFound { struct_name: String, offset: u64 },
    #[error("Name collision: '{0}' already exists")]
    NameCollision(String),
    #[error("Offset {offset:#x} of {struct_name} is occupied")]
    Occupied { struct_name: String, offset: u64 },
    #[error("Type has no storage size: {0}")]
    InvalidType(String),
    #[error("{outer} cannot hold {inner} by value: {inner} already contains {outer}")]
    EmbedCycle { outer: String, inner: String },
    #[error("No function at {0:#x}")]
    FunctionNotFound(u64),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Symbol error: {0}")]
    Symbol(#[from] SymbolError),
}
