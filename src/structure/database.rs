// Mon Jan 19 2026 - Alex

use crate::memory::Address;
use crate::structure::{FuncSignature, Member, MemberFlags, StructLayout, StructureError, TypeInfo};
use crate::xref::{MemberRef, XRef, XRefKind, XRefTarget};

/// The struct/type database of the analysis session.
///
/// The reconstruction engine only talks to the database through this trait,
/// so it can run inside a host disassembler or against [`TypeStore`] in tests.
///
/// [`TypeStore`]: crate::structure::TypeStore
pub trait TypeDatabase {
    fn pointer_size(&self) -> u64;

    fn get_struct(&self, name: &str) -> Option<&StructLayout>;

    /// Returns `true` when the struct was created, `false` when it existed.
    fn get_or_create_struct(&mut self, name: &str, is_union: bool) -> Result<bool, StructureError>;

    /// Renames a struct; every type referring to it follows the rename.
    fn rename_struct(&mut self, old_name: &str, new_name: &str) -> Result<(), StructureError>;

    /// Adds a member and returns the offset it landed at. `offset: None`
    /// appends. With `overwrite`, members in the way are deleted first.
    fn add_member(
        &mut self,
        struct_name: &str,
        name: &str,
        type_info: Option<TypeInfo>,
        offset: Option<u64>,
        overwrite: bool,
        flags: MemberFlags,
    ) -> Result<u64, StructureError>;

    fn set_member_type(&mut self, struct_name: &str, offset: u64, type_info: TypeInfo) -> Result<(), StructureError>;

    fn rename_member(&mut self, struct_name: &str, offset: u64, name: &str) -> Result<(), StructureError>;

    /// Adds a user cross-reference, replacing one of the same kind from `from`.
    fn add_xref(&mut self, from: MemberRef, to: XRefTarget, kind: XRefKind) -> Result<(), StructureError>;

    fn xrefs_from(&self, from: &MemberRef) -> Vec<XRef>;

    fn name_at(&self, ea: Address) -> Option<String>;

    fn set_name_at(&mut self, ea: Address, name: &str) -> Result<(), StructureError>;

    fn has_user_name(&self, ea: Address) -> bool;

    fn function_by_name(&self, name: &str) -> Option<Address>;

    fn is_func_start(&self, ea: Address) -> bool;

    fn function_signature(&self, ea: Address) -> Option<FuncSignature>;

    fn set_function_signature(&mut self, ea: Address, signature: FuncSignature) -> Result<(), StructureError>;

    fn decompiler_available(&self) -> bool;

    fn parse_type(&self, text: &str) -> Result<TypeInfo, StructureError>;

    fn member_at(&self, struct_name: &str, offset: u64) -> Option<&Member> {
        self.get_struct(struct_name)?.member_at(offset)
    }

    fn struct_size(&self, name: &str) -> Option<u64> {
        self.get_struct(name).map(StructLayout::size)
    }

    /// Struct a member embeds by value or points at.
    fn member_struct(&self, struct_name: &str, offset: u64) -> Option<&StructLayout> {
        let ty = self.member_at(struct_name, offset)?.type_info()?;
        let target = ty.struct_name().or_else(|| ty.pointee_struct_name())?;
        self.get_struct(target)
    }

    fn function_name(&self, ea: Address) -> Option<String> {
        if !self.is_func_start(ea) {
            return None;
        }
        self.name_at(ea)
    }

    fn set_function_name(&mut self, ea: Address, name: &str) -> Result<(), StructureError> {
        if !self.is_func_start(ea) {
            return Err(StructureError::FunctionNotFound(ea.as_u64()));
        }
        self.set_name_at(ea, name)
    }
}
