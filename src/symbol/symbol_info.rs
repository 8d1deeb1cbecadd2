// Tue Jan 13 2026 - Alex

use crate::memory::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    name: String,
    address: Address,
    kind: SymbolKind,
    source: NameSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Data,
}

/// Who gave the address its current name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameSource {
    /// Generated by the analyzer (`sub_401000`, `off_5000`, ...).
    Auto,
    /// Typed in by a person or imported from symbols.
    User,
}

impl SymbolInfo {
    pub fn new(name: String, address: Address, kind: SymbolKind) -> Self {
        Self {
            name,
            address,
            kind,
            source: NameSource::Auto,
        }
    }

    pub fn with_source(mut self, source: NameSource) -> Self {
        self.source = source;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn source(&self) -> NameSource {
        self.source
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function)
    }

    pub fn is_user_named(&self) -> bool {
        matches!(self.source, NameSource::User)
    }

    pub(crate) fn rename(&mut self, name: String, source: NameSource) {
        self.name = name;
        self.source = source;
    }
}

impl fmt::Display for SymbolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.name, self.address)
    }
}
