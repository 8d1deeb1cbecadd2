// Tue Jan 13 2026 - Alex

use crate::structure::{Member, StructLayout, TypeDatabase};
use itertools::Itertools;
use std::fmt::Write;

/// Renders struct and union records as C declarations.
pub struct DeclFormatter {
    indent: usize,
    show_offsets: bool,
    show_size: bool,
}

impl DeclFormatter {
    pub fn new() -> Self {
        Self {
            indent: 2,
            show_offsets: true,
            show_size: true,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_offsets(mut self, show: bool) -> Self {
        self.show_offsets = show;
        self
    }

    pub fn with_size(mut self, show: bool) -> Self {
        self.show_size = show;
        self
    }

    pub fn format_struct(&self, layout: &StructLayout) -> String {
        let keyword = if layout.is_union() { "union" } else { "struct" };
        let mut out = String::new();

        if self.show_size {
            let _ = writeln!(out, "{} {} // sizeof=0x{:X}", keyword, layout.name(), layout.size());
        } else {
            let _ = writeln!(out, "{} {}", keyword, layout.name());
        }
        out.push_str("{\n");
        for member in layout.members() {
            let line = self.format_member(member);
            // union members are keyed by ordinal, not byte offset
            if self.show_offsets && !layout.is_union() {
                let _ = writeln!(out, "{:indent$}{:<48} // +0x{:X}", "", line, member.offset(), indent = self.indent);
            } else {
                let _ = writeln!(out, "{:indent$}{}", "", line, indent = self.indent);
            }
        }
        out.push_str("};\n");
        out
    }

    /// Every struct in `names`, separated by blank lines. Unknown names are
    /// skipped.
    pub fn format_many(&self, db: &dyn TypeDatabase, names: &[String]) -> String {
        names
            .iter()
            .filter_map(|name| db.get_struct(name))
            .map(|layout| self.format_struct(layout))
            .join("\n")
    }

    fn format_member(&self, member: &Member) -> String {
        match member.type_info() {
            Some(ty) => format!("{};", ty.declare(member.name())),
            None if member.size() == 1 => format!("char {};", member.name()),
            None => format!("char {}[{}];", member.name(), member.size()),
        }
    }
}

impl Default for DeclFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{CallingConv, FuncParam, FuncSignature, MemberFlags, TypeInfo, TypeStore};

    #[test]
    fn test_format_vtable_struct() {
        let mut db = TypeStore::new(8);
        db.get_or_create_struct("CFoo_vftable", false).unwrap();
        let slot = TypeInfo::pointer_to(TypeInfo::Function(FuncSignature::new(
            TypeInfo::Void,
            CallingConv::Thiscall,
            vec![FuncParam::new(Some("this"), TypeInfo::named_ptr("CFoo"))],
        )));
        db.add_member("CFoo_vftable", "CFoo::Tick", Some(slot), Some(0), false, MemberFlags::OFFSET_TARGET)
            .unwrap();
        db.add_member("CFoo_vftable", "dummy", None, Some(8), false, MemberFlags::empty())
            .unwrap();

        let text = DeclFormatter::new().format_struct(db.get_struct("CFoo_vftable").unwrap());
        assert!(text.starts_with("struct CFoo_vftable // sizeof=0x10\n{\n"));
        assert!(text.contains("void (__thiscall *CFoo::Tick)(CFoo *this);"));
        assert!(text.contains("char dummy[8];"));
        assert!(text.contains("// +0x8"));
        assert!(text.ends_with("};\n"));
    }

    #[test]
    fn test_format_union_without_offsets() {
        let mut db = TypeStore::new(8);
        db.get_or_create_struct("CA_vftable_orig", false).unwrap();
        db.add_member("CA_vftable_orig", "dummy", None, None, false, MemberFlags::empty()).unwrap();
        db.get_or_create_struct("CA_vftable", true).unwrap();
        db.add_member("CA_vftable", "CA", Some(TypeInfo::named("CA_vftable_orig")), None, false, MemberFlags::empty())
            .unwrap();

        let text = DeclFormatter::new()
            .with_size(false)
            .format_many(&db, &["CA_vftable".to_string(), "CMissing".to_string()]);
        assert!(text.starts_with("union CA_vftable\n"));
        assert!(text.contains("  CA_vftable_orig CA;\n"));
        assert!(!text.contains("+0x"));
    }
}
