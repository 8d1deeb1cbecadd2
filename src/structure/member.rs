// Tue Jan 13 2026 - Alex

use crate::structure::TypeInfo;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MemberFlags: u32 {
        /// Sub-object of a base class rather than a plain field.
        const BASECLASS = 0x1;
        /// Holds an offset/pointer the listing should follow.
        const OFFSET_TARGET = 0x2;
    }
}

/// A member of a struct or union. For unions, `offset` is the member ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    name: String,
    offset: u64,
    size: u64,
    type_info: Option<TypeInfo>,
    flags: MemberFlags,
}

impl Member {
    pub fn new(name: &str, offset: u64, size: u64, type_info: Option<TypeInfo>) -> Self {
        Self {
            name: name.to_string(),
            offset,
            size,
            type_info,
            flags: MemberFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    pub fn is_baseclass(&self) -> bool {
        self.flags.contains(MemberFlags::BASECLASS)
    }

    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.offset && offset < self.end_offset().max(self.offset.saturating_add(1))
    }

    /// Struct embedded by value in this member, if any.
    pub fn substruct_name(&self) -> Option<&str> {
        self.type_info.as_ref().and_then(TypeInfo::struct_name)
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_type(&mut self, type_info: Option<TypeInfo>, size: u64) {
        self.type_info = type_info;
        self.size = size;
    }

    pub(crate) fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    pub(crate) fn type_info_mut(&mut self) -> Option<&mut TypeInfo> {
        self.type_info.as_mut()
    }
}
