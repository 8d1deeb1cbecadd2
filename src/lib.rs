// Tue Jan 15 2026 - Alex

pub mod config;
pub mod cpp;
pub mod engine;
pub mod memory;
pub mod output;
pub mod structure;
pub mod symbol;
pub mod ui;
pub mod utils;
pub mod xref;

pub use config::Config;
pub use cpp::{ClassComposer, LayoutError, PopulateOptions, PopulateReport};
pub use engine::Session;
pub use memory::{Address, ImageMemory};
pub use structure::{TypeDatabase, TypeStore};
