// Tue Jan 13 2026 - Alex

pub mod address;
pub mod binary;
pub mod error;
pub mod image;
pub mod traits;

pub use address::Address;
pub use binary::{BinaryMemory, BinarySymbol};
pub use error::MemoryError;
pub use image::{AppliedStruct, ImageMemory, ImageSegment};
pub use traits::{BinaryImage, MemoryReader, MemoryWriter};
