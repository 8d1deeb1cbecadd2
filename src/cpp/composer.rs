// Tue Jan 20 2026 - Alex

use crate::cpp::union::vtable_field_name;
use crate::cpp::{
    add_child_vtable, find_vtable_ownership, populate, LayoutError, MemberKind, PopulateOptions, PopulateReport,
};
use crate::memory::{Address, BinaryImage};
use crate::structure::{MemberFlags, TypeDatabase, TypeInfo};
use crate::symbol::naming;
use crate::xref::{MemberRef, XRefKind, XRefTarget};
use log::{debug, info, warn};

/// The vtable struct a class's slots get written to, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VtableTarget {
    pub struct_name: String,
    pub this_type: TypeInfo,
    /// Class that declares the vtable pointer, when it already existed.
    pub owner: Option<String>,
}

/// Top-level class reconstruction over one database and image.
pub struct ClassComposer<'a> {
    db: &'a mut dyn TypeDatabase,
    image: &'a mut dyn BinaryImage,
    options: PopulateOptions,
}

impl<'a> ClassComposer<'a> {
    pub fn new(db: &'a mut dyn TypeDatabase, image: &'a mut dyn BinaryImage) -> Self {
        Self {
            db,
            image,
            options: PopulateOptions::default(),
        }
    }

    /// Base options for every population pass (ignore list, markers, ...).
    pub fn with_options(mut self, options: PopulateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn db(&self) -> &dyn TypeDatabase {
        &*self.db
    }

    /// Creates the class struct. With a parent it derives from it at offset
    /// 0; otherwise `has_vtable` gives it an empty vtable of its own.
    pub fn create_class(
        &mut self,
        class_name: &str,
        has_vtable: bool,
        parent: Option<&str>,
    ) -> Result<bool, LayoutError> {
        let created = self.db.get_or_create_struct(class_name, false)?;
        match parent {
            Some(parent) => {
                if !self.add_baseclass(class_name, parent, 0) {
                    return Err(LayoutError::InvalidInput(format!(
                        "{} cannot derive from {}",
                        class_name, parent
                    )));
                }
            }
            None if has_vtable => {
                let vtable = naming::class_vtable_struct_name(class_name, 0);
                self.db.get_or_create_struct(&vtable, false)?;
                self.add_class_vtable(class_name, &vtable, 0)?;
            }
            None => {}
        }
        Ok(created)
    }

    /// Puts a `vfptr` to `vtable_name` at `offset` of the class, replacing
    /// whatever was there.
    pub fn add_class_vtable(&mut self, class_name: &str, vtable_name: &str, offset: u64) -> Result<(), LayoutError> {
        let field = vtable_field_name(&*self.db, class_name, offset);
        let ty = TypeInfo::named_ptr(vtable_name);
        if let Err(err) = self
            .db
            .add_member(class_name, &field, Some(ty), Some(offset), true, MemberFlags::empty())
        {
            warn!("vtable {} couldn't be added to {} at offset 0x{:X}: {}", vtable_name, class_name, offset, err);
            return Err(err.into());
        }
        self.db.add_xref(
            MemberRef::new(class_name, offset),
            XRefTarget::Struct(vtable_name.to_string()),
            XRefKind::Offset,
        )?;
        Ok(())
    }

    /// Picks (creating if needed) the vtable struct for the class's vtable at
    /// `offset` and wires it into the class or its bases.
    pub fn create_vtable_struct(
        &mut self,
        class_name: &str,
        offset: u64,
        parent_name: Option<&str>,
    ) -> Result<VtableTarget, LayoutError> {
        debug!("create_vtable_struct({}, 0x{:X})", class_name, offset);
        if self.db.get_struct(class_name).is_none() {
            return Err(LayoutError::NotFound(class_name.to_string()));
        }

        let located = match find_vtable_ownership(&*self.db, class_name, offset) {
            Ok(found) => {
                debug!("Found parent vtable {} 0x{:X} in {}", class_name, offset, found.owner);
                Some(found)
            }
            Err(err) => {
                debug!("No parent vtable for {} 0x{:X}: {}", class_name, offset, err);
                None
            }
        };
        let owner = located.as_ref().map(|found| found.owner.clone());
        let this_class = match (offset, &owner, parent_name) {
            (0, _, _) => class_name.to_string(),
            (_, Some(owner), _) => owner.clone(),
            (_, None, Some(parent)) => parent.to_string(),
            (_, None, None) => class_name.to_string(),
        };
        let this_type = TypeInfo::named_ptr(&this_class);
        let vtable_name = naming::class_vtable_struct_name(class_name, offset);

        match located {
            Some(found) if !found.chain.is_empty() => {
                self.db.get_or_create_struct(&vtable_name, false)?;
                for link in &found.chain {
                    if let Err(err) = add_child_vtable(&mut *self.db, &link.struct_name, class_name, &vtable_name, link.offset) {
                        warn!(
                            "Couldn't add {} as a view of {}+0x{:X}: {}",
                            vtable_name, link.struct_name, link.offset, err
                        );
                    }
                }
                Ok(VtableTarget {
                    struct_name: vtable_name,
                    this_type,
                    owner,
                })
            }
            Some(found) if found.kind == MemberKind::VtableUnionPointer => {
                // The class already owns a vtables union; its slots live in its own view.
                let union_name = found.vtable_name().unwrap_or_default().to_string();
                let view = self
                    .db
                    .get_struct(&union_name)
                    .and_then(|u| u.member_by_name(class_name))
                    .map(|m| m.offset())
                    .and_then(|ordinal| self.db.member_struct(&union_name, ordinal))
                    .map(|s| s.name().to_string())
                    .ok_or_else(|| LayoutError::NotFound(format!("{} view of {}", class_name, union_name)))?;
                Ok(VtableTarget {
                    struct_name: view,
                    this_type,
                    owner,
                })
            }
            _ => {
                self.db.get_or_create_struct(&vtable_name, false)?;
                self.add_class_vtable(class_name, &vtable_name, offset)?;
                Ok(VtableTarget {
                    struct_name: vtable_name,
                    this_type,
                    owner,
                })
            }
        }
    }

    /// Builds the vtable of `class_name` at `offset_in_class` from the
    /// function pointers starting at `start`. `add_func_this` overrides the
    /// composer's options when given.
    pub fn make_vtable(
        &mut self,
        class_name: &str,
        start: Address,
        stop: Option<Address>,
        offset_in_class: u64,
        parent_name: Option<&str>,
        add_func_this: Option<bool>,
    ) -> Result<PopulateReport, LayoutError> {
        self.db.get_or_create_struct(class_name, false)?;
        let target = self.create_vtable_struct(class_name, offset_in_class, parent_name)?;

        let mut options = self.options.clone().with_this_type(target.this_type);
        if let Some(add_func_this) = add_func_this {
            options = options.with_add_func_this(add_func_this);
        }
        options.stop_address = stop.or(options.stop_address);
        if let Some(parent) = parent_name {
            options.parent_name = Some(parent.to_string());
        }

        let report = populate(&mut *self.db, &mut *self.image, &target.struct_name, start, class_name, &options)?;
        info!("make_vtable({}, {}, 0x{:X}): {}", class_name, start, offset_in_class, report);
        Ok(report)
    }

    /// Embeds `base_name` in `class_name` at `offset`. Returns false, changing
    /// nothing, when either class is missing, `base_name` already contains
    /// `class_name`, or the member cannot be added.
    pub fn add_baseclass(&mut self, class_name: &str, base_name: &str, offset: u64) -> bool {
        if class_name == base_name || self.db.get_struct(class_name).is_none() || self.db.get_struct(base_name).is_none() {
            debug!("add_baseclass({}, {}): class not found", class_name, base_name);
            return false;
        }
        let member_name = naming::base_member_name(base_name, offset);
        match self.db.add_member(
            class_name,
            &member_name,
            Some(TypeInfo::named(base_name)),
            Some(offset),
            true,
            MemberFlags::BASECLASS,
        ) {
            Ok(_) => true,
            Err(err) => {
                debug!("add_baseclass({}, {}): {}", class_name, base_name, err);
                false
            }
        }
    }
}
