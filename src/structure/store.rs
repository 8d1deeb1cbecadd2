// Mon Jan 19 2026 - Alex

use crate::memory::Address;
use crate::structure::parse;
use crate::structure::{
    FuncSignature, Member, MemberFlags, StructLayout, StructureError, TypeDatabase, TypeInfo,
};
use crate::symbol::{NameSource, SymbolInfo, SymbolKind, SymbolTable};
use crate::xref::{MemberRef, XRef, XRefKind, XRefTarget};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Struct a type stores by value, looking through arrays.
fn embedded_struct(ty: &TypeInfo) -> Option<&str> {
    match ty {
        TypeInfo::Named(name) => Some(name),
        TypeInfo::Array(elem, _) => embedded_struct(elem),
        _ => None,
    }
}

/// In-memory type database. Structs keep their creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeStore {
    pointer_size: u64,
    decompiler: bool,
    structs: IndexMap<String, StructLayout>,
    symbols: SymbolTable,
    signatures: BTreeMap<u64, FuncSignature>,
    xrefs: Vec<XRef>,
}

impl TypeStore {
    pub fn new(pointer_size: u64) -> Self {
        Self {
            pointer_size,
            decompiler: true,
            structs: IndexMap::new(),
            symbols: SymbolTable::new(),
            signatures: BTreeMap::new(),
            xrefs: Vec::new(),
        }
    }

    pub fn with_decompiler(mut self, available: bool) -> Self {
        self.decompiler = available;
        self
    }

    /// Registers a function start. Unnamed functions get the analyzer's
    /// `sub_XXXX` name.
    pub fn add_function(
        &mut self,
        ea: Address,
        name: Option<&str>,
        signature: Option<FuncSignature>,
    ) -> Result<(), StructureError> {
        let symbol = match name {
            Some(name) => SymbolInfo::new(name.to_string(), ea, SymbolKind::Function).with_source(NameSource::User),
            None => SymbolInfo::new(format!("sub_{:X}", ea.as_u64()), ea, SymbolKind::Function),
        };
        self.symbols.add(symbol)?;
        if let Some(signature) = signature {
            self.signatures.insert(ea.as_u64(), signature);
        }
        Ok(())
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructLayout> {
        self.structs.values()
    }

    pub fn xrefs(&self) -> &[XRef] {
        &self.xrefs
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn type_size(&self, type_info: Option<&TypeInfo>) -> Result<u64, StructureError> {
        let ty = match type_info {
            Some(ty) => ty,
            None => return Ok(self.pointer_size),
        };
        let resolve = |name: &str| self.structs.get(name).map(StructLayout::size);
        match ty.size(self.pointer_size, &resolve) {
            Some(size) if size > 0 => Ok(size),
            _ => Err(StructureError::InvalidType(ty.to_string())),
        }
    }

    /// True when `outer` holds `inner` by value, directly or through
    /// another embedded struct.
    fn embeds(&self, outer: &str, inner: &str) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![outer];
        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            let Some(layout) = self.structs.get(name) else {
                continue;
            };
            for nested in layout.members().filter_map(|m| m.type_info().and_then(embedded_struct)) {
                if nested == inner {
                    return true;
                }
                pending.push(nested);
            }
        }
        false
    }

    fn check_embedding(&self, struct_name: &str, type_info: Option<&TypeInfo>) -> Result<(), StructureError> {
        if let Some(inner) = type_info.and_then(embedded_struct) {
            if inner == struct_name || self.embeds(inner, struct_name) {
                return Err(StructureError::EmbedCycle {
                    outer: struct_name.to_string(),
                    inner: inner.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Re-sizes every by-value member holding `changed` (and, in turn, the
    /// structs embedding those) after `changed` grew or shrank. A member that
    /// grows over the fields behind it displaces them.
    fn propagate_size(&mut self, changed: &str) {
        let pointer_size = self.pointer_size;
        let mut pending = vec![changed.to_string()];
        // cycles are rejected on insert, but a hand-edited session could hold one
        let mut budget = self.structs.len().saturating_mul(self.structs.len()).saturating_add(1);

        while let Some(inner) = pending.pop() {
            if budget == 0 {
                warn!("Gave up resizing members embedding {}", changed);
                return;
            }
            budget -= 1;
            let inner_size = match self.structs.get(&inner) {
                Some(layout) => layout.size(),
                None => continue,
            };
            let resolve = |_: &str| Some(inner_size);
            let mut displaced = Vec::new();

            for layout in self.structs.values_mut() {
                let resized: Vec<(u64, u64)> = layout
                    .members()
                    .filter_map(|m| {
                        let ty = m.type_info()?;
                        if embedded_struct(ty)? != inner {
                            return None;
                        }
                        let size = ty.size(pointer_size, &resolve).filter(|s| *s > 0)?;
                        (size != m.size()).then_some((m.offset(), size))
                    })
                    .collect();
                if resized.is_empty() {
                    continue;
                }

                let before = layout.size();
                for (offset, size) in resized {
                    if !layout.is_union() {
                        let in_the_way: Vec<u64> =
                            layout.overlapping(offset, size).into_iter().filter(|o| *o != offset).collect();
                        for old in &in_the_way {
                            if let Some(member) = layout.remove(*old) {
                                warn!(
                                    "{}.{} at 0x{:X} overlapped by grown {} and removed",
                                    layout.name(),
                                    member.name(),
                                    old,
                                    inner
                                );
                            }
                        }
                        if !in_the_way.is_empty() {
                            displaced.push((layout.name().to_string(), in_the_way));
                        }
                    }
                    if let Some(member) = layout.member_at_mut(offset) {
                        member.set_size(size);
                    }
                }
                if layout.size() != before {
                    pending.push(layout.name().to_string());
                }
            }

            for (struct_name, offsets) in displaced {
                self.drop_xrefs_from(&struct_name, &offsets);
            }
        }
    }

    /// Inserts without any layout checks, to build broken databases in tests.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, struct_name: &str, member: Member) {
        if let Some(layout) = self.structs.get_mut(struct_name) {
            layout.insert(member);
        }
    }

    fn layout_mut(&mut self, name: &str) -> Result<&mut StructLayout, StructureError> {
        self.structs
            .get_mut(name)
            .ok_or_else(|| StructureError::StructNotFound(name.to_string()))
    }

    fn drop_xrefs_from(&mut self, struct_name: &str, offsets: &[u64]) {
        self.xrefs
            .retain(|x| !(x.from().struct_name == struct_name && offsets.contains(&x.from().offset)));
    }
}

impl TypeDatabase for TypeStore {
    fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    fn get_struct(&self, name: &str) -> Option<&StructLayout> {
        self.structs.get(name)
    }

    fn get_or_create_struct(&mut self, name: &str, is_union: bool) -> Result<bool, StructureError> {
        if self.structs.contains_key(name) {
            return Ok(false);
        }
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(StructureError::ParseError(format!("invalid struct name '{}'", name)));
        }
        self.structs.insert(name.to_string(), StructLayout::new(name, is_union));
        Ok(true)
    }

    fn rename_struct(&mut self, old_name: &str, new_name: &str) -> Result<(), StructureError> {
        if self.structs.contains_key(new_name) {
            return Err(StructureError::NameCollision(new_name.to_string()));
        }
        let index = self
            .structs
            .get_index_of(old_name)
            .ok_or_else(|| StructureError::StructNotFound(old_name.to_string()))?;

        let (_, mut layout) = self
            .structs
            .shift_remove_index(index)
            .ok_or_else(|| StructureError::StructNotFound(old_name.to_string()))?;
        layout.set_name(new_name);
        self.structs.shift_insert(index, new_name.to_string(), layout);

        for layout in self.structs.values_mut() {
            for member in layout.members_mut() {
                if let Some(ty) = member.type_info_mut() {
                    ty.retarget(old_name, new_name);
                }
            }
        }
        for signature in self.signatures.values_mut() {
            signature.ret.retarget(old_name, new_name);
            for param in &mut signature.params {
                param.ty.retarget(old_name, new_name);
            }
        }
        for xref in &mut self.xrefs {
            xref.retarget_struct(old_name, new_name);
        }
        Ok(())
    }

    fn add_member(
        &mut self,
        struct_name: &str,
        name: &str,
        type_info: Option<TypeInfo>,
        offset: Option<u64>,
        overwrite: bool,
        flags: MemberFlags,
    ) -> Result<u64, StructureError> {
        if name.is_empty() {
            return Err(StructureError::ParseError("empty member name".to_string()));
        }
        let size = self.type_size(type_info.as_ref())?;
        let layout = self
            .structs
            .get(struct_name)
            .ok_or_else(|| StructureError::StructNotFound(struct_name.to_string()))?;
        self.check_embedding(struct_name, type_info.as_ref())?;

        let offset = offset.unwrap_or_else(|| layout.next_offset());
        if !layout.is_union() && offset.checked_add(size).is_none() {
            return Err(StructureError::Occupied {
                struct_name: struct_name.to_string(),
                offset,
            });
        }
        let size_before = layout.size();
        let in_the_way = layout.overlapping(offset, size);
        if !in_the_way.is_empty() && !overwrite {
            return Err(StructureError::Occupied {
                struct_name: struct_name.to_string(),
                offset,
            });
        }
        if let Some(same_name) = layout.member_by_name(name) {
            if !in_the_way.contains(&same_name.offset()) {
                return Err(StructureError::NameCollision(name.to_string()));
            }
        }

        let layout = self.layout_mut(struct_name)?;
        for old in &in_the_way {
            layout.remove(*old);
        }
        layout.insert(Member::new(name, offset, size, type_info).with_flags(flags));
        let size_after = layout.size();
        self.drop_xrefs_from(struct_name, &in_the_way);
        if size_after != size_before {
            self.propagate_size(struct_name);
        }
        Ok(offset)
    }

    fn set_member_type(&mut self, struct_name: &str, offset: u64, type_info: TypeInfo) -> Result<(), StructureError> {
        let size = self.type_size(Some(&type_info))?;
        let layout = self
            .structs
            .get(struct_name)
            .ok_or_else(|| StructureError::StructNotFound(struct_name.to_string()))?;
        self.check_embedding(struct_name, Some(&type_info))?;
        let size_before = layout.size();
        let member = layout.member_at(offset).ok_or_else(|| StructureError::MemberNotFound {
            struct_name: struct_name.to_string(),
            offset,
        })?;
        let start = member.offset();
        if layout.overlapping(start, size).iter().any(|o| *o != start) {
            return Err(StructureError::Occupied {
                struct_name: struct_name.to_string(),
                offset: start,
            });
        }

        let layout = self.layout_mut(struct_name)?;
        if let Some(member) = layout.member_at_mut(start) {
            member.set_type(Some(type_info), size);
        }
        if layout.size() != size_before {
            self.propagate_size(struct_name);
        }
        Ok(())
    }

    fn rename_member(&mut self, struct_name: &str, offset: u64, name: &str) -> Result<(), StructureError> {
        let layout = self.layout_mut(struct_name)?;
        if let Some(existing) = layout.member_by_name(name) {
            if existing.offset() != offset {
                return Err(StructureError::NameCollision(name.to_string()));
            }
        }
        let member = layout.member_at_mut(offset).ok_or_else(|| StructureError::MemberNotFound {
            struct_name: struct_name.to_string(),
            offset,
        })?;
        member.set_name(name);
        Ok(())
    }

    fn add_xref(&mut self, from: MemberRef, to: XRefTarget, kind: XRefKind) -> Result<(), StructureError> {
        if self.member_at(&from.struct_name, from.offset).is_none() {
            return Err(StructureError::MemberNotFound {
                struct_name: from.struct_name.clone(),
                offset: from.offset,
            });
        }
        self.xrefs.retain(|x| !(x.from() == &from && x.kind() == kind));
        self.xrefs.push(XRef::new(from, to, kind));
        Ok(())
    }

    fn xrefs_from(&self, from: &MemberRef) -> Vec<XRef> {
        self.xrefs.iter().filter(|x| x.from() == from).cloned().collect()
    }

    fn name_at(&self, ea: Address) -> Option<String> {
        self.symbols.name_at(ea).map(str::to_string)
    }

    fn set_name_at(&mut self, ea: Address, name: &str) -> Result<(), StructureError> {
        self.symbols.set_name(ea, name, NameSource::User)?;
        Ok(())
    }

    fn has_user_name(&self, ea: Address) -> bool {
        self.symbols.get(ea).map(SymbolInfo::is_user_named).unwrap_or(false)
    }

    fn function_by_name(&self, name: &str) -> Option<Address> {
        self.symbols
            .find(name)
            .filter(|s| s.is_function())
            .map(SymbolInfo::address)
    }

    fn is_func_start(&self, ea: Address) -> bool {
        self.symbols.get(ea).map(SymbolInfo::is_function).unwrap_or(false)
    }

    fn function_signature(&self, ea: Address) -> Option<FuncSignature> {
        self.signatures.get(&ea.as_u64()).cloned()
    }

    fn set_function_signature(&mut self, ea: Address, signature: FuncSignature) -> Result<(), StructureError> {
        if !self.is_func_start(ea) {
            return Err(StructureError::FunctionNotFound(ea.as_u64()));
        }
        self.signatures.insert(ea.as_u64(), signature);
        Ok(())
    }

    fn decompiler_available(&self) -> bool {
        self.decompiler
    }

    fn parse_type(&self, text: &str) -> Result<TypeInfo, StructureError> {
        parse::parse_type(text, &|name| self.structs.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_class() -> TypeStore {
        let mut store = TypeStore::new(8);
        store.get_or_create_struct("CFoo", false).unwrap();
        store.get_or_create_struct("CFoo_vftable", false).unwrap();
        store
            .add_member("CFoo_vftable", "sub_1000", None, Some(0), false, MemberFlags::empty())
            .unwrap();
        store
            .add_member("CFoo", "vfptr", Some(TypeInfo::named_ptr("CFoo_vftable")), Some(0), false, MemberFlags::empty())
            .unwrap();
        store
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut store = TypeStore::new(8);
        assert!(store.get_or_create_struct("CFoo", false).unwrap());
        assert!(!store.get_or_create_struct("CFoo", false).unwrap());
    }

    #[test]
    fn test_add_member_without_overwrite_fails_when_occupied() {
        let mut store = store_with_class();
        let err = store
            .add_member("CFoo", "field_0", None, Some(4), false, MemberFlags::empty())
            .unwrap_err();
        assert!(matches!(err, StructureError::Occupied { .. }));
    }

    #[test]
    fn test_add_member_overwrite_drops_old_xrefs() {
        let mut store = store_with_class();
        let from = MemberRef::new("CFoo_vftable", 0);
        store
            .add_xref(from.clone(), XRefTarget::Address(Address::new(0x1000)), XRefKind::Indirect)
            .unwrap();
        store
            .add_member("CFoo_vftable", "CFoo::sub_2000", None, Some(0), true, MemberFlags::empty())
            .unwrap();

        assert!(store.xrefs_from(&from).is_empty());
        assert_eq!(store.member_at("CFoo_vftable", 0).unwrap().name(), "CFoo::sub_2000");
    }

    #[test]
    fn test_add_member_name_collision() {
        let mut store = store_with_class();
        let err = store
            .add_member("CFoo_vftable", "sub_1000", None, Some(8), true, MemberFlags::empty())
            .unwrap_err();
        assert_eq!(err, StructureError::NameCollision("sub_1000".to_string()));
    }

    #[test]
    fn test_append_member() {
        let mut store = store_with_class();
        let offset = store
            .add_member("CFoo_vftable", "sub_2000", None, None, false, MemberFlags::empty())
            .unwrap();
        assert_eq!(offset, 8);
        assert_eq!(store.struct_size("CFoo_vftable"), Some(16));
    }

    #[test]
    fn test_rename_struct_retargets_references() {
        let mut store = store_with_class();
        store
            .add_xref(MemberRef::new("CFoo", 0), XRefTarget::Struct("CFoo_vftable".to_string()), XRefKind::Offset)
            .unwrap();
        store.rename_struct("CFoo_vftable", "CFoo_vftable_orig").unwrap();

        assert!(store.get_struct("CFoo_vftable").is_none());
        let ty = store.member_at("CFoo", 0).unwrap().type_info().unwrap();
        assert_eq!(ty.pointee_struct_name(), Some("CFoo_vftable_orig"));
        assert_eq!(
            store.xrefs_from(&MemberRef::new("CFoo", 0))[0].to(),
            &XRefTarget::Struct("CFoo_vftable_orig".to_string())
        );
        assert_eq!(store.member_struct("CFoo", 0).unwrap().name(), "CFoo_vftable_orig");
    }

    #[test]
    fn test_rename_struct_collision() {
        let mut store = store_with_class();
        let err = store.rename_struct("CFoo_vftable", "CFoo").unwrap_err();
        assert_eq!(err, StructureError::NameCollision("CFoo".to_string()));
    }

    #[test]
    fn test_embedded_member_size_follows_struct() {
        let mut store = store_with_class();
        store.get_or_create_struct("CDerived", false).unwrap();
        store
            .add_member("CDerived", "CFoo_0", Some(TypeInfo::named("CFoo")), Some(0), false, MemberFlags::BASECLASS)
            .unwrap();
        let member = store.member_at("CDerived", 0).unwrap();
        assert_eq!(member.size(), 8);
        assert!(member.is_baseclass());
    }

    #[test]
    fn test_embedded_member_grows_with_base() {
        let mut store = store_with_class();
        store.get_or_create_struct("CDerived", false).unwrap();
        store
            .add_member("CDerived", "CFoo_0", Some(TypeInfo::named("CFoo")), Some(0), false, MemberFlags::BASECLASS)
            .unwrap();
        store.get_or_create_struct("CTop", false).unwrap();
        store
            .add_member("CTop", "CDerived_0", Some(TypeInfo::named("CDerived")), Some(0), false, MemberFlags::BASECLASS)
            .unwrap();
        store
            .add_member("CTop", "m_tail", None, Some(8), false, MemberFlags::empty())
            .unwrap();

        store
            .add_member("CFoo", "m_value", None, Some(8), false, MemberFlags::empty())
            .unwrap();

        assert_eq!(store.member_at("CDerived", 0).unwrap().size(), 16);
        assert_eq!(store.member_at("CTop", 0).unwrap().size(), 16);
        // the grown base now covers the old tail field
        assert_eq!(store.member_at("CTop", 8).unwrap().name(), "CDerived_0");
        assert_eq!(store.get_struct("CTop").unwrap().member_count(), 1);
    }

    #[test]
    fn test_union_view_grows_with_view_struct() {
        let mut store = store_with_class();
        store.get_or_create_struct("CFoo_vtables", true).unwrap();
        store
            .add_member("CFoo_vtables", "CFoo", Some(TypeInfo::named("CFoo_vftable")), None, false, MemberFlags::empty())
            .unwrap();
        assert_eq!(store.struct_size("CFoo_vtables"), Some(8));

        store
            .add_member("CFoo_vftable", "sub_2000", None, None, false, MemberFlags::empty())
            .unwrap();
        assert_eq!(store.member_at("CFoo_vtables", 0).unwrap().size(), 16);
        assert_eq!(store.struct_size("CFoo_vtables"), Some(16));
    }

    #[test]
    fn test_set_member_type_propagates_size() {
        let mut store = store_with_class();
        store.get_or_create_struct("CDerived", false).unwrap();
        store
            .add_member("CDerived", "CFoo_0", Some(TypeInfo::named("CFoo")), Some(0), false, MemberFlags::BASECLASS)
            .unwrap();
        store
            .set_member_type("CFoo", 0, TypeInfo::Array(Box::new(TypeInfo::named_ptr("CFoo_vftable")), 3))
            .unwrap();
        assert_eq!(store.member_at("CDerived", 0).unwrap().size(), 24);
    }

    #[test]
    fn test_embedding_cycle_rejected() {
        let mut store = store_with_class();
        store.get_or_create_struct("CDerived", false).unwrap();
        store
            .add_member("CDerived", "CFoo_0", Some(TypeInfo::named("CFoo")), Some(0), false, MemberFlags::BASECLASS)
            .unwrap();
        store.get_or_create_struct("CTop", false).unwrap();
        store
            .add_member("CTop", "CDerived_0", Some(TypeInfo::named("CDerived")), Some(0), false, MemberFlags::BASECLASS)
            .unwrap();

        let err = store
            .add_member("CFoo", "CTop_8", Some(TypeInfo::named("CTop")), Some(8), false, MemberFlags::BASECLASS)
            .unwrap_err();
        assert!(matches!(err, StructureError::EmbedCycle { .. }));
        let err = store
            .add_member("CFoo", "self_8", Some(TypeInfo::Array(Box::new(TypeInfo::named("CFoo")), 2)), Some(8), false, MemberFlags::empty())
            .unwrap_err();
        assert!(matches!(err, StructureError::EmbedCycle { .. }));
        assert!(store.set_member_type("CFoo", 0, TypeInfo::named("CDerived")).is_err());
        assert_eq!(store.get_struct("CFoo").unwrap().member_count(), 1);

        // pointers back to a derived class are fine
        store
            .add_member("CFoo", "m_owner", Some(TypeInfo::named_ptr("CTop")), Some(8), false, MemberFlags::empty())
            .unwrap();
    }

    #[test]
    fn test_member_past_address_space_rejected() {
        let mut store = store_with_class();
        let err = store
            .add_member("CFoo", "m_far", None, Some(u64::MAX - 2), false, MemberFlags::empty())
            .unwrap_err();
        assert!(matches!(err, StructureError::Occupied { .. }));
    }

    #[test]
    fn test_zero_sized_member_rejected() {
        let mut store = TypeStore::new(8);
        store.get_or_create_struct("CEmpty", false).unwrap();
        store.get_or_create_struct("CFoo", false).unwrap();
        let err = store
            .add_member("CFoo", "CEmpty_0", Some(TypeInfo::named("CEmpty")), Some(0), false, MemberFlags::empty())
            .unwrap_err();
        assert!(matches!(err, StructureError::InvalidType(_)));
    }

    #[test]
    fn test_functions_and_names() {
        let mut store = TypeStore::new(8);
        store.add_function(Address::new(0x1000), None, None).unwrap();
        assert!(store.is_func_start(Address::new(0x1000)));
        assert_eq!(store.function_name(Address::new(0x1000)).as_deref(), Some("sub_1000"));
        assert!(!store.has_user_name(Address::new(0x1000)));

        store.set_function_name(Address::new(0x1000), "CFoo::sub_1000").unwrap();
        assert!(store.has_user_name(Address::new(0x1000)));
        assert_eq!(store.function_by_name("CFoo::sub_1000"), Some(Address::new(0x1000)));
        assert!(store.set_function_name(Address::new(0x2000), "x").is_err());
    }

    #[test]
    fn test_parse_type_uses_known_structs() {
        let store = store_with_class();
        assert_eq!(store.parse_type("CFoo *").unwrap(), TypeInfo::named_ptr("CFoo"));
        assert!(store.parse_type("CNope *").is_err());
    }
}
