// Tue Jan 13 2026 - Alex

use crate::memory::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A struct member, identified by its owner and byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    pub struct_name: String,
    pub offset: u64,
}

impl MemberRef {
    pub fn new(struct_name: &str, offset: u64) -> Self {
        Self {
            struct_name: struct_name.to_string(),
            offset,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+0x{:X}", self.struct_name, self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XRefTarget {
    Address(Address),
    Struct(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XRefKind {
    /// Data reference by offset (member -> vtable struct).
    Offset,
    /// Indirect code reference (vtable slot -> function).
    Indirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XRef {
    from: MemberRef,
    to: XRefTarget,
    kind: XRefKind,
    user: bool,
}

impl XRef {
    pub fn new(from: MemberRef, to: XRefTarget, kind: XRefKind) -> Self {
        Self {
            from,
            to,
            kind,
            user: true,
        }
    }

    pub fn from(&self) -> &MemberRef {
        &self.from
    }

    pub fn to(&self) -> &XRefTarget {
        &self.to
    }

    pub fn kind(&self) -> XRefKind {
        self.kind
    }

    pub fn is_user(&self) -> bool {
        self.user
    }

    pub fn target_address(&self) -> Option<Address> {
        match &self.to {
            XRefTarget::Address(addr) => Some(*addr),
            XRefTarget::Struct(_) => None,
        }
    }

    pub(crate) fn retarget_struct(&mut self, old: &str, new: &str) {
        if self.from.struct_name == old {
            self.from.struct_name = new.to_string();
        }
        if let XRefTarget::Struct(name) = &mut self.to {
            if name == old {
                *name = new.to_string();
            }
        }
    }
}
