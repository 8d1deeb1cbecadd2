// Tue Jan 13 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read failed at address {0:#x}")]
    ReadFailed(u64),
    #[error("Write failed at address {0:#x}")]
    WriteFailed(u64),
    #[error("Binary parse error: {0}")]
    BinaryParseError(String),
    #[error("Unsupported pointer size: {0}")]
    InvalidPointerSize(u64),
    #[error("Not supported: {0}")]
    NotSupported(String),
}
