// Tue Jan 13 2026 - Alex

use crate::memory::Address;
use crate::symbol::{NameSource, SymbolError, SymbolInfo, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Names of addresses, unique in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<SymbolInfo>", into = "Vec<SymbolInfo>")]
pub struct SymbolTable {
    by_address: BTreeMap<u64, SymbolInfo>,
    by_name: HashMap<String, u64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            by_address: BTreeMap::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn add(&mut self, symbol: SymbolInfo) -> Result<(), SymbolError> {
        validate_name(symbol.name())?;
        self.check_free(symbol.name(), symbol.address())?;
        if let Some(old) = self.by_address.remove(&symbol.address().as_u64()) {
            self.by_name.remove(old.name());
        }
        self.by_name.insert(symbol.name().to_string(), symbol.address().as_u64());
        self.by_address.insert(symbol.address().as_u64(), symbol);
        Ok(())
    }

    /// Renames an address, creating a data symbol if it had no name yet.
    pub fn set_name(&mut self, address: Address, name: &str, source: NameSource) -> Result<(), SymbolError> {
        validate_name(name)?;
        self.check_free(name, address)?;

        match self.by_address.get_mut(&address.as_u64()) {
            Some(symbol) => {
                self.by_name.remove(symbol.name());
                symbol.rename(name.to_string(), source);
            }
            None => {
                let symbol = SymbolInfo::new(name.to_string(), address, SymbolKind::Data).with_source(source);
                self.by_address.insert(address.as_u64(), symbol);
            }
        }
        self.by_name.insert(name.to_string(), address.as_u64());
        Ok(())
    }

    pub fn get(&self, address: Address) -> Option<&SymbolInfo> {
        self.by_address.get(&address.as_u64())
    }

    pub fn find(&self, name: &str) -> Option<&SymbolInfo> {
        self.by_name.get(name).and_then(|addr| self.by_address.get(addr))
    }

    pub fn name_at(&self, address: Address) -> Option<&str> {
        self.get(address).map(|s| s.name())
    }

    pub fn functions(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.by_address.values().filter(|s| s.is_function())
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    fn check_free(&self, name: &str, address: Address) -> Result<(), SymbolError> {
        match self.by_name.get(name) {
            Some(existing) if *existing != address.as_u64() => Err(SymbolError::NameCollision {
                name: name.to_string(),
                existing: *existing,
            }),
            _ => Ok(()),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<SymbolInfo>> for SymbolTable {
    fn from(symbols: Vec<SymbolInfo>) -> Self {
        let mut table = Self::new();
        for symbol in symbols {
            table.by_name.insert(symbol.name().to_string(), symbol.address().as_u64());
            table.by_address.insert(symbol.address().as_u64(), symbol);
        }
        table
    }
}

impl From<SymbolTable> for Vec<SymbolInfo> {
    fn from(table: SymbolTable) -> Self {
        table.by_address.into_values().collect()
    }
}

fn validate_name(name: &str) -> Result<(), SymbolError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(SymbolError::InvalidName(name.to_string()));
    }
    Ok(())
}
