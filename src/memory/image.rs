// Mon Jan 19 2026 - Alex

use crate::memory::{Address, MemoryError, MemoryReader, MemoryWriter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loaded chunk of the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSegment {
    pub name: String,
    pub start: Address,
    pub data: Vec<u8>,
}

impl ImageSegment {
    pub fn end(&self) -> Address {
        Address::new(self.start.as_u64().saturating_add(self.data.len() as u64))
    }

    pub fn contains(&self, addr: Address, len: usize) -> bool {
        match addr.as_u64().checked_add(len as u64) {
            Some(end) => addr >= self.start && end <= self.end().as_u64(),
            None => false,
        }
    }
}

/// A struct instance stamped onto the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedStruct {
    pub struct_name: String,
    pub size: u64,
}

/// In-memory image: mapped segments, per-address disassembly text and the
/// struct instances applied over data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMemory {
    pointer_size: u64,
    segments: Vec<ImageSegment>,
    disasm: BTreeMap<u64, String>,
    applied: BTreeMap<u64, AppliedStruct>,
}

impl ImageMemory {
    pub fn new(pointer_size: u64) -> Self {
        Self {
            pointer_size,
            segments: Vec::new(),
            disasm: BTreeMap::new(),
            applied: BTreeMap::new(),
        }
    }

    pub fn add_segment(&mut self, name: &str, start: Address, data: Vec<u8>) {
        self.segments.push(ImageSegment {
            name: name.to_string(),
            start,
            data,
        });
        self.segments.sort_by_key(|s| s.start);
    }

    /// Maps a table of pointer-sized little-endian values at `start`.
    pub fn map_pointers(&mut self, name: &str, start: Address, values: &[u64]) {
        let mut data = Vec::with_capacity(values.len() * self.pointer_size as usize);
        for value in values {
            if self.pointer_size == 4 {
                data.extend_from_slice(&(*value as u32).to_le_bytes());
            } else {
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
        self.add_segment(name, start, data);
    }

    pub fn set_disasm_line(&mut self, addr: Address, line: &str) {
        self.disasm.insert(addr.as_u64(), line.to_string());
    }

    pub fn applied_struct(&self, addr: Address) -> Option<&AppliedStruct> {
        self.applied.get(&addr.as_u64())
    }

    pub fn segments(&self) -> &[ImageSegment] {
        &self.segments
    }

    fn segment_for(&self, addr: Address, len: usize) -> Option<usize> {
        self.segments.iter().position(|s| s.contains(addr, len))
    }
}

impl MemoryReader for ImageMemory {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let index = self
            .segment_for(addr, len)
            .ok_or(MemoryError::ReadFailed(addr.as_u64()))?;
        let segment = &self.segments[index];
        let start = (addr.as_u64() - segment.start.as_u64()) as usize;
        Ok(segment.data[start..start + len].to_vec())
    }

    fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    fn disasm_line(&self, addr: Address) -> Option<String> {
        self.disasm.get(&addr.as_u64()).cloned()
    }
}

impl MemoryWriter for ImageMemory {
    fn apply_struct(&mut self, addr: Address, struct_name: &str, size: u64) -> Result<(), MemoryError> {
        if size > 0 && self.segment_for(addr, size as usize).is_none() {
            return Err(MemoryError::WriteFailed(addr.as_u64()));
        }

        // Undefine whatever was stamped over the same bytes.
        let end = addr.as_u64().saturating_add(size.max(1));
        let overlapping: Vec<u64> = self
            .applied
            .iter()
            .filter(|(start, item)| **start < end && start.saturating_add(item.size.max(1)) > addr.as_u64())
            .map(|(start, _)| *start)
            .collect();
        for start in overlapping {
            self.applied.remove(&start);
        }

        self.applied.insert(
            addr.as_u64(),
            AppliedStruct {
                struct_name: struct_name.to_string(),
                size,
            },
        );
        Ok(())
    }
}
