// Tue Jan 13 2026 - Alex

pub mod error;
pub mod naming;
pub mod symbol_info;
pub mod table;

pub use error::SymbolError;
pub use symbol_info::{NameSource, SymbolInfo, SymbolKind};
pub use table::SymbolTable;
