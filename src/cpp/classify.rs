// Tue Jan 20 2026 - Alex

use crate::structure::{Member, StructLayout, TypeDatabase};
use crate::symbol::naming;
use serde::Serialize;
use std::fmt;

/// What a class member is, as far as vtable reconstruction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberKind {
    /// `vfptr` pointing at a single vtable struct.
    PlainVtablePointer,
    /// `vfptr` pointing at a union of vtable views.
    VtableUnionPointer,
    /// Embedded struct of a base class.
    BaseClassSubobject,
    OrdinaryField,
}

impl MemberKind {
    pub fn is_vtable_pointer(self) -> bool {
        matches!(self, Self::PlainVtablePointer | Self::VtableUnionPointer)
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::PlainVtablePointer => "vtable pointer",
            Self::VtableUnionPointer => "vtables union pointer",
            Self::BaseClassSubobject => "base class",
            Self::OrdinaryField => "field",
        };
        write!(f, "{}", text)
    }
}

/// A struct is a vtable if it carries the vtable postfix, or is a union named
/// as a vtables union.
pub fn is_vtable_struct(layout: &StructLayout) -> bool {
    naming::is_vtable_struct_name(layout.name())
        || (layout.is_union() && naming::is_vtables_union_name(layout.name()))
}

pub fn classify_member(db: &dyn TypeDatabase, member: &Member) -> MemberKind {
    let ty = match member.type_info() {
        Some(ty) => ty,
        None => return MemberKind::OrdinaryField,
    };

    if naming::is_valid_vtable_name(member.name()) {
        let pointee = ty.pointee_struct_name().and_then(|name| db.get_struct(name));
        if let Some(vtable) = pointee.filter(|s| is_vtable_struct(s)) {
            return if vtable.is_union() {
                MemberKind::VtableUnionPointer
            } else {
                MemberKind::PlainVtablePointer
            };
        }
    }

    let embeds_struct = member
        .substruct_name()
        .map(|name| db.get_struct(name).is_some())
        .unwrap_or(false);
    if embeds_struct {
        return MemberKind::BaseClassSubobject;
    }
    MemberKind::OrdinaryField
}
