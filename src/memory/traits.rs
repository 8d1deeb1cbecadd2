// Wed Jan 15 2026 - Alex

use crate::memory::{Address, MemoryError};

/// Read side of the binary image being analyzed.
pub trait MemoryReader {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError>;

    /// Width of a code pointer in the image (4 or 8).
    fn pointer_size(&self) -> u64;

    /// Rendered disassembly line at `addr`, if the image carries one.
    fn disasm_line(&self, addr: Address) -> Option<String>;

    fn read_u32(&self, addr: Address) -> Result<u32, MemoryError> {
        let bytes = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&self, addr: Address) -> Result<u64, MemoryError> {
        let bytes = self.read_bytes(addr, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_ptr(&self, addr: Address) -> Result<Address, MemoryError> {
        match self.pointer_size() {
            4 => self.read_u32(addr).map(|v| Address::new(v as u64)),
            8 => self.read_u64(addr).map(Address::new),
            other => Err(MemoryError::InvalidPointerSize(other)),
        }
    }
}

/// Write side: typing data in the image.
pub trait MemoryWriter {
    /// Marks `size` bytes at `addr` as an instance of `struct_name`.
    fn apply_struct(&mut self, addr: Address, struct_name: &str, size: u64) -> Result<(), MemoryError>;
}

pub trait BinaryImage: MemoryReader + MemoryWriter {}

impl<T: MemoryReader + MemoryWriter> BinaryImage for T {}
