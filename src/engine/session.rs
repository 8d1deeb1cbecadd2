// Tue Jan 20 2026 - Alex

use crate::config::Config;
use crate::cpp::{ClassComposer, PopulateOptions};
use crate::memory::{Address, BinaryMemory, ImageMemory, MemoryError};
use crate::structure::{FuncSignature, StructureError, TypeDatabase, TypeStore};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session file is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Type database plus the image it describes, persisted as one JSON file
/// between command invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub db: TypeStore,
    pub image: ImageMemory,
}

impl Session {
    pub fn new(pointer_size: u64) -> Self {
        Self {
            db: TypeStore::new(pointer_size),
            image: ImageMemory::new(pointer_size),
        }
    }

    /// Loads segments and function symbols of an ELF, PE or Mach-O file.
    /// Symbols that can't be registered (aliases, odd names) are skipped.
    pub fn import_binary<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let binary = BinaryMemory::load(path.as_ref())?;
        let pointer_size = crate::memory::MemoryReader::pointer_size(&binary.image);
        let mut db = TypeStore::new(pointer_size);

        let mut imported = 0usize;
        for symbol in &binary.functions {
            match db.add_function(symbol.address, Some(&symbol.name), None) {
                Ok(()) => imported += 1,
                Err(err) => debug!("Skipping {} at {}: {}", symbol.name, symbol.address, err),
            }
        }
        info!(
            "Imported {} segments and {}/{} functions from {}",
            binary.image.segments().len(),
            imported,
            binary.functions.len(),
            path.as_ref().display()
        );

        Ok(Self { db, image: binary.image })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Marks a function start, optionally with its name and prototype.
    pub fn add_function(
        &mut self,
        ea: Address,
        name: Option<&str>,
        signature: Option<&str>,
    ) -> Result<(), SessionError> {
        let signature: Option<FuncSignature> = match signature {
            Some(text) => match self.db.parse_type(text)?.as_function() {
                Some(sig) => Some(sig.clone()),
                None => {
                    warn!("'{}' is not a function prototype, ignored", text);
                    None
                }
            },
            None => None,
        };
        self.db.add_function(ea, name, signature)?;
        Ok(())
    }

    /// Attaches disassembly text to `ea`, e.g. `dq offset _purecall` on a
    /// vtable slot.
    pub fn annotate(&mut self, ea: Address, line: &str) {
        self.image.set_disasm_line(ea, line);
    }

    /// Composer over this session, configured from `config`.
    pub fn composer(&mut self, config: &Config) -> ClassComposer<'_> {
        ClassComposer::new(&mut self.db, &mut self.image).with_options(PopulateOptions::from_config(config))
    }
}
