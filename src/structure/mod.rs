// Tue Jan 15 2026 - Alex

pub mod database;
pub mod error;
pub mod layout;
pub mod member;
pub mod parse;
pub mod store;
pub mod type_info;

pub use database::TypeDatabase;
pub use error::StructureError;
pub use layout::StructLayout;
pub use member::{Member, MemberFlags};
pub use store::TypeStore;
pub use type_info::{CallingConv, FuncParam, FuncSignature, PrimitiveType, TypeInfo};
