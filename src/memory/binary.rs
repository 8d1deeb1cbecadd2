// Tue Jan 13 2026 - Alex

use crate::memory::{Address, ImageMemory, MemoryError};
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::sym::STT_FUNC;
use goblin::mach::Mach;
use goblin::Object;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A function symbol harvested from the file headers.
#[derive(Debug, Clone)]
pub struct BinarySymbol {
    pub name: String,
    pub address: Address,
}

/// Segments and function symbols of an ELF, PE or Mach-O file.
pub struct BinaryMemory {
    pub image: ImageMemory,
    pub functions: Vec<BinarySymbol>,
}

impl BinaryMemory {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let mut file = File::open(path.as_ref()).map_err(MemoryError::Io)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(MemoryError::Io)?;
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self, MemoryError> {
        let object = Object::parse(data)
            .map_err(|e| MemoryError::BinaryParseError(format!("Failed to parse binary: {}", e)))?;

        match object {
            Object::Elf(elf) => {
                let mut image = ImageMemory::new(if elf.is_64 { 8 } else { 4 });
                for (index, header) in elf.program_headers.iter().enumerate() {
                    if header.p_type != PT_LOAD {
                        continue;
                    }
                    let bytes = file_slice(data, header.p_offset, header.p_filesz, header.p_memsz)?;
                    image.add_segment(&format!("LOAD{}", index), Address::new(header.p_vaddr), bytes);
                }

                let functions = elf
                    .syms
                    .iter()
                    .filter(|sym| sym.st_type() == STT_FUNC && sym.st_value != 0)
                    .filter_map(|sym| {
                        elf.strtab.get_at(sym.st_name).map(|name| BinarySymbol {
                            name: name.to_string(),
                            address: Address::new(sym.st_value),
                        })
                    })
                    .collect();

                Ok(Self { image, functions })
            }
            Object::PE(pe) => {
                let mut image = ImageMemory::new(if pe.is_64 { 8 } else { 4 });
                let image_base = pe.image_base as u64;
                for section in &pe.sections {
                    let name = section.name().unwrap_or("").to_string();
                    let bytes = file_slice(
                        data,
                        section.pointer_to_raw_data as u64,
                        section.size_of_raw_data as u64,
                        section.virtual_size.max(section.size_of_raw_data) as u64,
                    )?;
                    image.add_segment(&name, Address::new(image_base + section.virtual_address as u64), bytes);
                }

                let functions = pe
                    .exports
                    .iter()
                    .filter_map(|export| {
                        export.name.map(|name| BinarySymbol {
                            name: name.to_string(),
                            address: Address::new(image_base + export.rva as u64),
                        })
                    })
                    .collect();

                Ok(Self { image, functions })
            }
            Object::Mach(Mach::Binary(macho)) => {
                let mut image = ImageMemory::new(if macho.is_64 { 8 } else { 4 });
                for segment in &macho.segments {
                    let segname = std::str::from_utf8(&segment.segname)
                        .unwrap_or("")
                        .trim_end_matches('\0')
                        .to_string();
                    if segment.vmsize == 0 {
                        continue;
                    }
                    let bytes = file_slice(data, segment.fileoff, segment.filesize, segment.vmsize)?;
                    image.add_segment(&segname, Address::new(segment.vmaddr), bytes);
                }
                Ok(Self { image, functions: Vec::new() })
            }
            Object::Mach(Mach::Fat(_)) => Err(MemoryError::NotSupported(
                "Fat binaries not supported".to_string(),
            )),
            _ => Err(MemoryError::NotSupported("Unknown object format".to_string())),
        }
    }
}

/// Copies `file_size` bytes at `offset` and zero-fills up to `mem_size`.
fn file_slice(data: &[u8], offset: u64, file_size: u64, mem_size: u64) -> Result<Vec<u8>, MemoryError> {
    let start = offset as usize;
    let end = start
        .checked_add(file_size as usize)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| MemoryError::BinaryParseError(format!("segment at file offset {:#x} is truncated", offset)))?;
    let mut bytes = data[start..end].to_vec();
    if mem_size > file_size {
        bytes.resize(mem_size as usize, 0);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slice_zero_fills_bss() {
        let data = [1u8, 2, 3, 4];
        let bytes = file_slice(&data, 1, 2, 4).unwrap();
        assert_eq!(bytes, vec![2, 3, 0, 0]);
    }

    #[test]
    fn test_file_slice_rejects_truncated_segment() {
        let data = [1u8, 2, 3, 4];
        assert!(file_slice(&data, 2, 8, 8).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(BinaryMemory::parse(&[0u8; 16]).is_err());
    }
}
