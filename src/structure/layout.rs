// Tue Jan 13 2026 - Alex

use crate::structure::Member;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A struct or union record of the type database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructLayout {
    name: String,
    is_union: bool,
    members: BTreeMap<u64, Member>,
}

impl StructLayout {
    pub fn new(name: &str, is_union: bool) -> Self {
        Self {
            name: name.to_string(),
            is_union,
            members: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_union(&self) -> bool {
        self.is_union
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member covering `offset`. Union members are addressed by ordinal.
    pub fn member_at(&self, offset: u64) -> Option<&Member> {
        if self.is_union {
            return self.members.get(&offset);
        }
        self.members
            .range(..=offset)
            .next_back()
            .map(|(_, m)| m)
            .filter(|m| m.contains(offset))
    }

    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        self.members.values().find(|m| m.name() == name)
    }

    pub fn size(&self) -> u64 {
        if self.is_union {
            return self.members.values().map(Member::size).max().unwrap_or(0);
        }
        self.members.values().map(Member::end_offset).max().unwrap_or(0)
    }

    /// Bytes for structs, member count for unions.
    pub fn max_offset(&self) -> u64 {
        if self.is_union {
            return self.members.len() as u64;
        }
        self.size()
    }

    /// Where an appended member lands.
    pub fn next_offset(&self) -> u64 {
        if self.is_union {
            return self.members.keys().next_back().map(|k| k.saturating_add(1)).unwrap_or(0);
        }
        self.size()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn member_at_mut(&mut self, offset: u64) -> Option<&mut Member> {
        let key = self.member_at(offset)?.offset();
        self.members.get_mut(&key)
    }

    pub(crate) fn members_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        self.members.values_mut()
    }

    /// Members intersecting `[offset, offset + size)`.
    pub(crate) fn overlapping(&self, offset: u64, size: u64) -> Vec<u64> {
        if self.is_union {
            return self.members.contains_key(&offset).then_some(offset).into_iter().collect();
        }
        let end = offset.saturating_add(size.max(1));
        self.members
            .values()
            .filter(|m| m.offset() < end && m.end_offset().max(m.offset().saturating_add(1)) > offset)
            .map(Member::offset)
            .collect()
    }

    pub(crate) fn remove(&mut self, offset: u64) -> Option<Member> {
        self.members.remove(&offset)
    }

    pub(crate) fn insert(&mut self, member: Member) {
        self.members.insert(member.offset(), member);
    }
}
