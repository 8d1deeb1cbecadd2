// Tue Jan 20 2026 - Alex

//! Multiple-inheritance support: a class whose vtable is shared by several
//! derived views gets its vtable pointer retyped to a union of those views.

use crate::cpp::{classify_member, LayoutError, MemberKind, UnionInstall};
use crate::structure::{Member, MemberFlags, StructureError, TypeDatabase, TypeInfo};
use crate::symbol::naming;
use crate::xref::{MemberRef, XRefKind, XRefTarget};
use log::{debug, info, warn};

fn collision(err: StructureError) -> LayoutError {
    match err {
        StructureError::NameCollision(name) => LayoutError::NameCollision(name),
        other => LayoutError::Database(other),
    }
}

/// Gives an empty struct a filler member so it can be embedded.
fn ensure_not_empty(db: &mut dyn TypeDatabase, struct_name: &str) -> Result<(), LayoutError> {
    if db.struct_size(struct_name) == Some(0) {
        db.add_member(struct_name, naming::DUMMY_MEMBER_NAME, None, None, false, MemberFlags::empty())?;
    }
    Ok(())
}

/// `vfptr`, or `vfptr_<HEX>` when another offset of the class already uses
/// the plain name.
pub(crate) fn vtable_field_name(db: &dyn TypeDatabase, class_name: &str, offset: u64) -> String {
    let field = naming::class_vtable_field_name(class_name);
    let taken = db
        .get_struct(class_name)
        .and_then(|s| s.member_by_name(field))
        .map(|m| m.offset() != offset)
        .unwrap_or(false);
    if taken {
        format!("{}_{:X}", field, offset)
    } else {
        field.to_string()
    }
}

/// Adds (or retypes) the union member `name`, returning its ordinal.
fn put_view(
    db: &mut dyn TypeDatabase,
    union_name: &str,
    name: &str,
    view_type: Option<TypeInfo>,
) -> Result<u64, LayoutError> {
    let existing = db
        .get_struct(union_name)
        .and_then(|u| u.member_by_name(name))
        .map(Member::offset);
    Ok(db.add_member(union_name, name, view_type, existing, true, MemberFlags::empty())?)
}

/// Turns the vtable pointer of `class_name` at `offset` into a pointer to a
/// union of vtable views.
///
/// The original vtable struct is renamed to `<name>_orig` and the union takes
/// over its old name, so every existing reference to the vtable name now
/// resolves to the union. Without an original vtable the union starts with an
/// `INTERFACE` view instead.
pub fn install_union(
    db: &mut dyn TypeDatabase,
    class_name: &str,
    existing_member: Option<&Member>,
    existing_vtable: Option<&str>,
    offset: u64,
) -> Result<UnionInstall, LayoutError> {
    debug!(
        "install_union({}, {:?}, {:?}, 0x{:X})",
        class_name,
        existing_member.map(Member::name),
        existing_vtable,
        offset
    );
    if db.get_struct(class_name).is_none() {
        return Err(LayoutError::NotFound(class_name.to_string()));
    }

    let original_name = match (existing_member, existing_vtable) {
        (Some(_), Some(vtable)) => vtable.to_string(),
        _ => naming::class_vtable_struct_name(class_name, offset),
    };
    let renamed = naming::orig_vtable_name(&original_name);

    let renamed_original = match db.get_struct(&original_name).map(|s| s.is_union()) {
        Some(true) => {
            return Err(LayoutError::InvalidInput(format!("{} is already a union", original_name)));
        }
        Some(false) => {
            db.rename_struct(&original_name, &renamed).map_err(|err| {
                warn!("Failed renaming {} -> {}: {}", original_name, renamed, err);
                collision(err)
            })?;
            Some(renamed)
        }
        None => None,
    };

    let union_name = original_name;
    db.get_or_create_struct(&union_name, true)?;

    let view_member = match &renamed_original {
        Some(renamed) => {
            ensure_not_empty(db, renamed)?;
            let view = naming::class_vtables_field_name(class_name);
            put_view(db, &union_name, &view, Some(TypeInfo::named(renamed)))?;
            view
        }
        None => {
            put_view(db, &union_name, naming::INTERFACE_VTABLE_NAME, None)?;
            naming::INTERFACE_VTABLE_NAME.to_string()
        }
    };

    let union_ptr = TypeInfo::named_ptr(&union_name);
    let at_offset = db.member_at(class_name, offset).cloned();
    let pointer_retyped = match at_offset {
        Some(member) if classify_member(db, &member) == MemberKind::BaseClassSubobject => {
            warn!(
                "{}+0x{:X} is base class '{}', leaving it in place",
                class_name,
                offset,
                member.name()
            );
            false
        }
        Some(member) if member.offset() == offset && classify_member(db, &member).is_vtable_pointer() => {
            db.set_member_type(class_name, offset, union_ptr)?;
            true
        }
        _ => {
            let field = vtable_field_name(db, class_name, offset);
            db.add_member(class_name, &field, Some(union_ptr), Some(offset), true, MemberFlags::empty())?;
            true
        }
    };
    if pointer_retyped {
        db.add_xref(
            MemberRef::new(class_name, offset),
            XRefTarget::Struct(union_name.clone()),
            XRefKind::Offset,
        )?;
    }

    info!("Installed vtables union {} for {}", union_name, class_name);
    Ok(UnionInstall {
        union_name,
        renamed_original,
        view_member,
        pointer_retyped,
    })
}

/// Adds `child_vtable` as the `child_name` view of the vtable that
/// `parent_name` has at `offset`, unionizing that vtable first if needed.
///
/// Returns the union the view was added to, or `None` when the parent has
/// no vtable struct of its own at that offset.
pub fn add_child_vtable(
    db: &mut dyn TypeDatabase,
    parent_name: &str,
    child_name: &str,
    child_vtable: &str,
    offset: u64,
) -> Result<Option<String>, LayoutError> {
    debug!("add_child_vtable({}, {}, {}, 0x{:X})", parent_name, child_name, child_vtable, offset);

    let parent_vtable = naming::class_vtable_struct_name(parent_name, offset);
    let parent_is_union = match db.get_struct(&parent_vtable) {
        Some(layout) => layout.is_union(),
        None => {
            debug!("{} has no {}, nothing to extend", parent_name, parent_vtable);
            return Ok(None);
        }
    };
    if db.get_struct(child_vtable).is_none() {
        return Err(LayoutError::NotFound(child_vtable.to_string()));
    }

    if !parent_is_union {
        debug!("{} vtable isn't a union, unionizing", parent_name);
        let member = db
            .member_at(parent_name, offset)
            .filter(|m| m.offset() == offset)
            .filter(|m| m.type_info().and_then(|t| t.pointee_struct_name()) == Some(parent_vtable.as_str()))
            .cloned();
        if member.is_none() {
            debug!("{}+0x{:X} does not point at {}", parent_name, offset, parent_vtable);
        }
        install_union(db, parent_name, member.as_ref(), Some(&parent_vtable), offset)?;
    }

    ensure_not_empty(db, child_vtable)?;
    let view = naming::class_vtables_field_name(child_name);
    let ordinal = put_view(db, &parent_vtable, &view, Some(TypeInfo::named(child_vtable)))?;
    db.add_xref(
        MemberRef::new(&parent_vtable, ordinal),
        XRefTarget::Struct(child_vtable.to_string()),
        XRefKind::Offset,
    )?;
    Ok(Some(parent_vtable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::TypeStore;

    fn base_class(db: &mut TypeStore) {
        db.get_or_create_struct("CBase", false).unwrap();
        db.get_or_create_struct("CBase_vftable", false).unwrap();
        db.add_member("CBase_vftable", "CBase::sub_1000", None, Some(0), false, MemberFlags::empty())
            .unwrap();
        db.add_member("CBase_vftable", "CBase::sub_1010", None, Some(8), false, MemberFlags::empty())
            .unwrap();
        db.add_member("CBase", "vfptr", Some(TypeInfo::named_ptr("CBase_vftable")), Some(0), false, MemberFlags::empty())
            .unwrap();
    }

    #[test]
    fn test_install_union_keeps_original_view() {
        let mut db = TypeStore::new(8);
        base_class(&mut db);
        let member = db.member_at("CBase", 0).cloned().unwrap();

        let install = install_union(&mut db, "CBase", Some(&member), Some("CBase_vftable"), 0).unwrap();

        assert_eq!(install.union_name, "CBase_vftable");
        assert_eq!(install.renamed_original.as_deref(), Some("CBase_vftable_orig"));
        assert!(install.pointer_retyped);

        let original = db.get_struct("CBase_vftable_orig").unwrap();
        assert_eq!(original.member_count(), 2);

        let union = db.get_struct("CBase_vftable").unwrap();
        assert!(union.is_union());
        assert_eq!(union.member_count(), 1);
        assert_eq!(union.member_at(0).unwrap().name(), "CBase");
        assert_eq!(union.member_at(0).unwrap().substruct_name(), Some("CBase_vftable_orig"));

        let vfptr = db.member_at("CBase", 0).unwrap();
        assert_eq!(vfptr.type_info().unwrap().pointee_struct_name(), Some("CBase_vftable"));
        assert_eq!(classify_member(&db, vfptr), MemberKind::VtableUnionPointer);
    }

    #[test]
    fn test_install_union_without_vtable_is_interface() {
        let mut db = TypeStore::new(8);
        db.get_or_create_struct("IThing", false).unwrap();

        let install = install_union(&mut db, "IThing", None, None, 0).unwrap();
        assert_eq!(install.view_member, "INTERFACE");
        assert!(install.renamed_original.is_none());
        assert_eq!(db.get_struct("IThing_vftable").unwrap().member_count(), 1);
        assert_eq!(db.member_at("IThing", 0).unwrap().name(), "vfptr");
    }

    #[test]
    fn test_install_union_collision_changes_nothing() {
        let mut db = TypeStore::new(8);
        base_class(&mut db);
        db.get_or_create_struct("CBase_vftable_orig", false).unwrap();

        let err = install_union(&mut db, "CBase", None, None, 0).unwrap_err();
        assert_eq!(err, LayoutError::NameCollision("CBase_vftable_orig".to_string()));
        assert!(!db.get_struct("CBase_vftable").unwrap().is_union());
        assert_eq!(
            db.member_at("CBase", 0).unwrap().type_info().unwrap().pointee_struct_name(),
            Some("CBase_vftable")
        );
    }

    #[test]
    fn test_install_union_leaves_base_subobject() {
        let mut db = TypeStore::new(8);
        base_class(&mut db);
        db.get_or_create_struct("CMid", false).unwrap();
        db.get_or_create_struct("CMid_vftable", false).unwrap();
        db.add_member("CMid", "CBase_0", Some(TypeInfo::named("CBase")), Some(0), false, MemberFlags::BASECLASS)
            .unwrap();

        let install = install_union(&mut db, "CMid", None, None, 0).unwrap();
        assert!(!install.pointer_retyped);
        assert_eq!(install.view_member, "CMid");
        assert!(db.get_struct("CMid_vftable_orig").is_some());
        assert_eq!(db.member_at("CMid", 0).unwrap().name(), "CBase_0");
    }

    #[test]
    fn test_add_child_vtable() {
        let mut db = TypeStore::new(8);
        base_class(&mut db);
        db.get_or_create_struct("CDerived_vftable", false).unwrap();

        let union = add_child_vtable(&mut db, "CBase", "CDerived", "CDerived_vftable", 0).unwrap();
        assert_eq!(union.as_deref(), Some("CBase_vftable"));

        let union = db.get_struct("CBase_vftable").unwrap();
        assert_eq!(union.member_count(), 2);
        let child = union.member_by_name("CDerived").unwrap();
        assert_eq!(child.substruct_name(), Some("CDerived_vftable"));

        // the empty child vtable got a filler so it could be embedded
        assert_eq!(db.member_at("CDerived_vftable", 0).unwrap().name(), "dummy");
        let xrefs = db.xrefs_from(&MemberRef::new("CBase_vftable", child.offset()));
        assert_eq!(xrefs[0].to(), &XRefTarget::Struct("CDerived_vftable".to_string()));

        // a second derived class reuses the union
        db.get_or_create_struct("COther_vftable", false).unwrap();
        add_child_vtable(&mut db, "CBase", "COther", "COther_vftable", 0).unwrap();
        assert_eq!(db.get_struct("CBase_vftable").unwrap().member_count(), 3);
        assert!(db.get_struct("CBase_vftable_orig_orig").is_none());
    }

    #[test]
    fn test_add_child_vtable_is_idempotent_per_child() {
        let mut db = TypeStore::new(8);
        base_class(&mut db);
        db.get_or_create_struct("CDerived_vftable", false).unwrap();

        add_child_vtable(&mut db, "CBase", "CDerived", "CDerived_vftable", 0).unwrap();
        add_child_vtable(&mut db, "CBase", "CDerived", "CDerived_vftable", 0).unwrap();
        assert_eq!(db.get_struct("CBase_vftable").unwrap().member_count(), 2);
    }

    #[test]
    fn test_add_child_vtable_without_parent_vtable() {
        let mut db = TypeStore::new(8);
        db.get_or_create_struct("CPlain", false).unwrap();
        db.get_or_create_struct("CDerived_vftable", false).unwrap();
        assert_eq!(add_child_vtable(&mut db, "CPlain", "CDerived", "CDerived_vftable", 0).unwrap(), None);
        assert!(db.get_struct("CPlain_vftable").is_none());
    }
}
