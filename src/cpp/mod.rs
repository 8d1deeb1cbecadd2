// Tue Jan 20 2026 - Alex

//! C++ class layout reconstruction: vtable discovery, vtable structs,
//! multiple-inheritance unions and override naming.

pub mod classify;
pub mod composer;
pub mod error;
pub mod locator;
pub mod overrides;
pub mod result;
pub mod union;
pub mod vtable;

pub use classify::{classify_member, is_vtable_struct, MemberKind};
pub use composer::{ClassComposer, VtableTarget};
pub use error::LayoutError;
pub use locator::find_vtable_ownership;
pub use overrides::{overridden_func_names, rename_override};
pub use result::{
    ChainLink, OverriddenFunc, PopulateReport, RenamedFunction, SlotOutcome, SlotStatus, StopReason, UnionInstall,
    VtableOwnership,
};
pub use union::{add_child_vtable, install_union};
pub use vtable::{
    classify_slot, fix_userpurge, make_funcptr, populate, update_func_name_with_class, update_func_this,
    PopulateOptions, SlotClass, SlotFilter,
};
