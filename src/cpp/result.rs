// Tue Jan 20 2026 - Alex

//! Result records handed back by the reconstruction passes. Every pass is
//! best-effort, so these carry what happened per item instead of a single
//! success flag.

use crate::cpp::MemberKind;
use crate::memory::Address;
use crate::structure::Member;
use serde::Serialize;
use std::fmt;

/// One hop of the base-class chain: a struct and the offset inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainLink {
    pub struct_name: String,
    pub offset: u64,
}

impl ChainLink {
    pub fn new(struct_name: &str, offset: u64) -> Self {
        Self {
            struct_name: struct_name.to_string(),
            offset,
        }
    }
}

/// Where the vtable pointer covering an offset of a class lives.
#[derive(Debug, Clone, Serialize)]
pub struct VtableOwnership {
    /// The vtable pointer member itself.
    pub member: Member,
    pub kind: MemberKind,
    /// Struct that declares `member`.
    pub owner: String,
    /// Base structs walked through to reach `owner`, outermost first.
    pub chain: Vec<ChainLink>,
}

impl VtableOwnership {
    /// Vtable (or vtables union) the pointer refers to.
    pub fn vtable_name(&self) -> Option<&str> {
        self.member.type_info().and_then(|t| t.pointee_struct_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The slot value is not the start of a function.
    NotFunction,
    /// The walk reached the caller's stop address.
    StopAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SlotStatus {
    Written,
    /// Listed in the ignore set and not a pure-virtual stub.
    SkippedIgnored,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotOutcome {
    pub slot_address: Address,
    pub function: Address,
    /// Member offset inside the vtable struct.
    pub offset: u64,
    pub name: String,
    pub status: SlotStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    pub vtable_struct: String,
    pub slots: Vec<SlotOutcome>,
    pub stop: StopReason,
    pub vtable_size: u64,
    /// Label given to the vtable head, when it was renamed.
    pub head_name: Option<String>,
}

impl PopulateReport {
    pub fn written(&self) -> impl Iterator<Item = &SlotOutcome> {
        self.slots.iter().filter(|s| s.status == SlotStatus::Written)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SlotOutcome> {
        self.slots.iter().filter(|s| matches!(s.status, SlotStatus::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }
}

impl fmt::Display for PopulateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} slots written, {} failed, size 0x{:X}",
            self.vtable_struct,
            self.written().count(),
            self.failed().count(),
            self.vtable_size
        )
    }
}

/// What `install_union` did to a class's vtable pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionInstall {
    pub union_name: String,
    /// The original vtable struct after its rename to `<name>_orig`.
    pub renamed_original: Option<String>,
    /// Union member added for the original view (`<Class>` or `INTERFACE`).
    pub view_member: String,
    /// Whether the class member now points at the union.
    pub pointer_retyped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFunction {
    pub class_name: String,
    pub address: Address,
    pub old_name: String,
    pub new_name: String,
}

/// A class view of a vtables union and the function it holds in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverriddenFunc {
    pub class_name: String,
    pub vtable_struct: String,
    pub offset: u64,
    pub func_name: String,
}
