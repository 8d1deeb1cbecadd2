// Tue Jan 20 2026 - Alex

use crate::config::Config;
use crate::cpp::{LayoutError, PopulateReport, SlotOutcome, SlotStatus, StopReason};
use crate::memory::{Address, BinaryImage, MemoryReader};
use crate::structure::{CallingConv, FuncParam, FuncSignature, MemberFlags, TypeDatabase, TypeInfo};
use crate::symbol::naming;
use crate::xref::{MemberRef, XRefKind, XRefTarget};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@<\w+>").unwrap());

/// Which slots of a function-pointer run are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotFilter<'a> {
    pub stop_address: Option<Address>,
    pub ignore_addresses: &'a [Address],
    /// Disassembly suffix of slots that point at the pure-virtual stub.
    pub pure_virtual_marker: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClass {
    Function {
        func: Address,
        next: Address,
        pure_virtual: bool,
    },
    Ignored {
        func: Address,
        next: Address,
    },
    Stop(StopReason),
}

/// Classifies the pointer-sized slot at `addr`.
pub fn classify_slot<R: MemoryReader + ?Sized>(
    image: &R,
    db: &dyn TypeDatabase,
    addr: Address,
    filter: &SlotFilter<'_>,
) -> SlotClass {
    let func = match image.read_ptr(addr) {
        Ok(func) => func,
        Err(err) => {
            debug!("Slot {} unreadable: {}", addr, err);
            return SlotClass::Stop(StopReason::NotFunction);
        }
    };
    if !db.is_func_start(func) {
        return SlotClass::Stop(StopReason::NotFunction);
    }
    if filter.stop_address.map(|stop| addr >= stop).unwrap_or(false) {
        return SlotClass::Stop(StopReason::StopAddress);
    }

    let next = addr + image.pointer_size();
    let pure_virtual = match filter.pure_virtual_marker {
        Some(marker) => image
            .disasm_line(addr)
            .map(|line| line.trim_end().ends_with(marker))
            .unwrap_or(false),
        None => false,
    };
    if filter.ignore_addresses.contains(&func) && !pure_virtual {
        return SlotClass::Ignored { func, next };
    }
    SlotClass::Function { func, next, pure_virtual }
}

/// Knobs of one vtable population pass.
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    /// Type of `this` given to every slot function. Defaults to `Class *`.
    pub this_type: Option<TypeInfo>,
    pub stop_address: Option<Address>,
    pub ignore_addresses: Vec<Address>,
    pub pure_virtual_marker: Option<String>,
    pub add_func_this: bool,
    /// Interleave `dummy_N` filler members before each slot.
    pub add_dummy_members: bool,
    pub parent_name: Option<String>,
    /// Address to stamp the vtable struct at. Defaults to the walk start.
    pub vtable_head: Option<Address>,
    pub force_rename_vtable_head: bool,
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self {
            this_type: None,
            stop_address: None,
            ignore_addresses: Vec::new(),
            pure_virtual_marker: None,
            add_func_this: true,
            add_dummy_members: false,
            parent_name: None,
            vtable_head: None,
            force_rename_vtable_head: false,
        }
    }
}

impl PopulateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ignore_addresses: config.ignore_functions.iter().copied().map(Address::new).collect(),
            pure_virtual_marker: config.pure_virtual_marker.clone(),
            add_func_this: config.add_func_this,
            add_dummy_members: config.add_dummy_members,
            force_rename_vtable_head: config.force_rename_vtable_head,
            ..Self::default()
        }
    }

    pub fn with_this_type(mut self, this_type: TypeInfo) -> Self {
        self.this_type = Some(this_type);
        self
    }

    pub fn with_stop_address(mut self, stop: Address) -> Self {
        self.stop_address = Some(stop);
        self
    }

    pub fn with_ignore_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.ignore_addresses = addresses;
        self
    }

    pub fn with_pure_virtual_marker(mut self, marker: &str) -> Self {
        self.pure_virtual_marker = Some(marker.to_string());
        self
    }

    pub fn with_add_func_this(mut self, add_func_this: bool) -> Self {
        self.add_func_this = add_func_this;
        self
    }

    pub fn with_dummy_members(mut self, add_dummy_members: bool) -> Self {
        self.add_dummy_members = add_dummy_members;
        self
    }

    pub fn with_parent_name(mut self, parent: &str) -> Self {
        self.parent_name = Some(parent.to_string());
        self
    }

    pub fn with_vtable_head(mut self, head: Address) -> Self {
        self.vtable_head = Some(head);
        self
    }

    pub fn with_force_rename(mut self, force: bool) -> Self {
        self.force_rename_vtable_head = force;
        self
    }

    fn filter(&self) -> SlotFilter<'_> {
        SlotFilter {
            stop_address: self.stop_address,
            ignore_addresses: &self.ignore_addresses,
            pure_virtual_marker: self.pure_virtual_marker.as_deref(),
        }
    }
}

/// Prefixes an analyzer-named function with its class. Returns the name the
/// function ends up with.
pub fn update_func_name_with_class(
    db: &mut dyn TypeDatabase,
    func: Address,
    class_name: &str,
) -> Result<String, LayoutError> {
    let name = db
        .function_name(func)
        .ok_or_else(|| LayoutError::NotFound(format!("function at {}", func)))?;
    if !naming::is_anonymous_name(&name) {
        return Ok(name);
    }
    let new_name = naming::qualified_name(class_name, &name);
    db.set_function_name(func, &new_name)?;
    Ok(new_name)
}

/// Rewrites a `__userpurge` prototype as `__thiscall` without register
/// annotations. Returns whether anything changed.
pub fn fix_userpurge(db: &mut dyn TypeDatabase, func: Address) -> Result<bool, LayoutError> {
    if !db.is_func_start(func) {
        return Ok(false);
    }
    let signature = match db.function_signature(func) {
        Some(signature) => signature,
        None => return Ok(false),
    };
    let text = signature.to_string();
    if !text.contains(CallingConv::Userpurge.keyword()) {
        return Ok(false);
    }

    let text = text.replace(CallingConv::Userpurge.keyword(), CallingConv::Thiscall.keyword());
    let text = LOCATION_RE.replace_all(&text, "");
    let fixed = match db.parse_type(&text) {
        Ok(TypeInfo::Function(fixed)) => fixed,
        Ok(other) => {
            warn!("{} Failed to fix userpurge: '{}' is not a prototype", func, other);
            return Ok(false);
        }
        Err(err) => {
            warn!("{} Failed to fix userpurge: {}", func, err);
            return Ok(false);
        }
    };
    db.set_function_signature(func, fixed)?;
    Ok(true)
}

/// Names the first argument of a `__thiscall`/`__fastcall` function `this`
/// and, when given, retypes it. Returns whether the prototype was updated.
pub fn update_func_this(
    db: &mut dyn TypeDatabase,
    func: Address,
    this_type: Option<&TypeInfo>,
) -> Result<bool, LayoutError> {
    let mut signature = match db.function_signature(func) {
        Some(signature) => signature,
        None => return Ok(false),
    };
    if !matches!(signature.cc, CallingConv::Thiscall | CallingConv::Fastcall) {
        return Ok(false);
    }
    let first = match signature.params.first_mut() {
        Some(first) => first,
        None => return Ok(false),
    };
    first.name = Some("this".to_string());
    if let Some(this_type) = this_type {
        first.ty = this_type.clone();
    }
    db.set_function_signature(func, signature)?;
    Ok(true)
}

/// `void (*)(this_type)`, used when no prototype is available.
pub fn make_funcptr(this_type: Option<&TypeInfo>) -> TypeInfo {
    let params = this_type
        .map(|ty| vec![FuncParam::new(None, ty.clone())])
        .unwrap_or_default();
    TypeInfo::pointer_to(TypeInfo::Function(FuncSignature::new(TypeInfo::Void, CallingConv::Unknown, params)))
}

fn slot_type(db: &mut dyn TypeDatabase, func: Address, this_type: Option<&TypeInfo>) -> TypeInfo {
    if !db.decompiler_available() {
        return make_funcptr(this_type);
    }
    if let Err(err) = fix_userpurge(db, func) {
        warn!("{} userpurge fix failed: {}", func, err);
    }
    if let Err(err) = update_func_this(db, func, this_type) {
        warn!("{} could not set this: {}", func, err);
    }
    match db.function_signature(func) {
        Some(signature) => TypeInfo::pointer_to(TypeInfo::Function(signature)),
        None => make_funcptr(this_type),
    }
}

fn fallback_name(db: &dyn TypeDatabase, func: Address) -> String {
    db.function_name(func)
        .unwrap_or_else(|| format!("{}{:X}", naming::ANONYMOUS_PREFIX, func.as_u64()))
}

/// The pure-virtual stub keeps its name; repeated stub slots get the slot
/// offset appended so each one still gets a member.
fn pure_virtual_slot_name(db: &dyn TypeDatabase, vtable_struct: &str, func: Address, offset: u64) -> String {
    let name = fallback_name(db, func);
    let taken = db
        .get_struct(vtable_struct)
        .and_then(|s| s.member_by_name(&name))
        .map(|m| m.offset() != offset)
        .unwrap_or(false);
    if taken {
        format!("{}_{:X}", name, offset)
    } else {
        name
    }
}

fn write_slot(
    db: &mut dyn TypeDatabase,
    vtable_struct: &str,
    name: &str,
    ty: TypeInfo,
    offset: u64,
    func: Address,
) -> SlotStatus {
    if let Err(err) = db.add_member(vtable_struct, name, Some(ty), Some(offset), true, MemberFlags::OFFSET_TARGET) {
        error!(
            "Couldn't add {} to vtable struct {} at offset 0x{:X}: {}",
            name, vtable_struct, offset, err
        );
        return SlotStatus::Failed(err.to_string());
    }
    let from = MemberRef::new(vtable_struct, offset);
    if let Err(err) = db.add_xref(from, XRefTarget::Address(func), XRefKind::Indirect) {
        warn!("Couldn't create xref between member {} and func {}: {}", name, func, err);
    }
    SlotStatus::Written
}

/// Walks the function-pointer run at `start` and writes one member per slot
/// into `vtable_struct`, then stamps and labels the vtable in the image.
pub fn populate(
    db: &mut dyn TypeDatabase,
    image: &mut dyn BinaryImage,
    vtable_struct: &str,
    start: Address,
    class_name: &str,
    options: &PopulateOptions,
) -> Result<PopulateReport, LayoutError> {
    if db.get_struct(vtable_struct).is_none() {
        return Err(LayoutError::NotFound(vtable_struct.to_string()));
    }

    let this_type = match (&options.this_type, options.add_func_this) {
        (_, false) => None,
        (Some(ty), true) => Some(ty.clone()),
        (None, true) => Some(TypeInfo::named_ptr(class_name)),
    };
    let word = image.pointer_size();
    let filter = options.filter();

    let mut slots = Vec::new();
    let mut offset = 0u64;
    let mut dummy_index = 1;
    let mut addr = start;
    let stop = loop {
        let (func, next, pure_virtual) = match classify_slot(&*image, &*db, addr, &filter) {
            SlotClass::Stop(reason) => break reason,
            SlotClass::Ignored { func, next } => {
                debug!("Skipping ignored function {} in slot {}", func, addr);
                slots.push(SlotOutcome {
                    slot_address: addr,
                    function: func,
                    offset,
                    name: db.function_name(func).unwrap_or_default(),
                    status: SlotStatus::SkippedIgnored,
                });
                offset += word;
                addr = next;
                continue;
            }
            SlotClass::Function { func, next, pure_virtual } => (func, next, pure_virtual),
        };

        let name = if pure_virtual {
            pure_virtual_slot_name(db, vtable_struct, func, offset)
        } else {
            match update_func_name_with_class(db, func, class_name) {
                Ok(name) => name,
                Err(err) => {
                    warn!("{} could not be renamed for {}: {}", func, class_name, err);
                    fallback_name(db, func)
                }
            }
        };
        let ty = slot_type(db, func, this_type.as_ref());

        if options.add_dummy_members {
            let dummy = format!("{}_{}", naming::DUMMY_MEMBER_NAME, dummy_index);
            if let Err(err) = db.add_member(vtable_struct, &dummy, Some(ty.clone()), Some(offset), true, MemberFlags::empty()) {
                warn!("Couldn't add {} to {}: {}", dummy, vtable_struct, err);
            }
            dummy_index += 1;
            offset += word;
        }

        let status = write_slot(db, vtable_struct, &name, ty, offset, func);
        slots.push(SlotOutcome {
            slot_address: addr,
            function: func,
            offset,
            name,
            status,
        });
        offset += word;
        addr = next;
    };

    let vtable_size = db.struct_size(vtable_struct).unwrap_or(0);
    let head = options.vtable_head.unwrap_or(start);
    if vtable_size > 0 {
        if let Err(err) = image.apply_struct(head, vtable_struct, vtable_size) {
            warn!("Couldn't apply {} at {}: {}", vtable_struct, head, err);
        }
    }

    let mut head_name = None;
    if !db.has_user_name(head) || options.force_rename_vtable_head {
        let parent = options
            .parent_name
            .clone()
            .or_else(|| this_type.as_ref().and_then(|t| t.pointee_struct_name()).map(str::to_string))
            .filter(|parent| parent != class_name);
        let label = naming::vtable_instance_name(class_name, parent.as_deref());
        match db.set_name_at(head, &label) {
            Ok(()) => head_name = Some(label),
            Err(err) => warn!("Couldn't name vtable head {} as {}: {}", head, label, err),
        }
    }

    let report = PopulateReport {
        vtable_struct: vtable_struct.to_string(),
        slots,
        stop,
        vtable_size,
        head_name,
    };
    info!("{}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ImageMemory;
    use crate::structure::{PrimitiveType, TypeStore};

    const VTABLE: u64 = 0x5000;

    fn setup(funcs: &[u64], slots: &[u64]) -> (TypeStore, ImageMemory) {
        let mut db = TypeStore::new(8);
        for f in funcs {
            db.add_function(Address::new(*f), None, None).unwrap();
        }
        db.get_or_create_struct("CFoo", false).unwrap();
        db.get_or_create_struct("CFoo_vftable", false).unwrap();
        let mut image = ImageMemory::new(8);
        image.map_pointers(".rdata", Address::new(VTABLE), slots);
        (db, image)
    }

    fn thiscall_sig(this: TypeInfo) -> FuncSignature {
        FuncSignature::new(
            TypeInfo::Primitive(PrimitiveType::I32),
            CallingConv::Thiscall,
            vec![
                FuncParam::new(Some("a1"), this),
                FuncParam::new(Some("a2"), TypeInfo::Primitive(PrimitiveType::I32)),
            ],
        )
    }

    #[test]
    fn test_stops_at_first_non_function() {
        let funcs = [0x1000, 0x1010, 0x1020, 0x1030, 0x1040];
        let slots = [0x1000, 0x1010, 0x1020, 0x1030, 0x1040, 0x7777, 0x1000, 0x1010];
        let (mut db, mut image) = setup(&funcs, &slots);

        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &PopulateOptions::default())
            .unwrap();

        assert_eq!(report.stop, StopReason::NotFunction);
        assert_eq!(report.written().count(), 5);
        assert_eq!(report.vtable_size, 5 * 8);
        assert_eq!(db.struct_size("CFoo_vftable"), Some(0x28));
        assert_eq!(image.applied_struct(Address::new(VTABLE)).unwrap().size, 0x28);
        assert_eq!(report.head_name.as_deref(), Some("CFoo::vftable"));
    }

    #[test]
    fn test_slots_are_named_typed_and_referenced() {
        let (mut db, mut image) = setup(&[0x1000, 0x1010], &[0x1000, 0x1010, 0]);
        db.set_function_name(Address::new(0x1010), "CFoo::Update").unwrap();

        populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &PopulateOptions::default())
            .unwrap();

        let first = db.member_at("CFoo_vftable", 0).unwrap();
        assert_eq!(first.name(), "CFoo::sub_1000");
        assert!(first.type_info().unwrap().is_funcptr());
        assert!(first.flags().contains(MemberFlags::OFFSET_TARGET));
        assert_eq!(db.function_name(Address::new(0x1000)).as_deref(), Some("CFoo::sub_1000"));
        assert_eq!(db.member_at("CFoo_vftable", 8).unwrap().name(), "CFoo::Update");

        for (offset, func) in [(0u64, 0x1000u64), (8, 0x1010)] {
            let xrefs = db.xrefs_from(&MemberRef::new("CFoo_vftable", offset));
            assert_eq!(xrefs.len(), 1);
            assert_eq!(xrefs[0].target_address(), Some(Address::new(func)));
            assert_eq!(xrefs[0].kind(), XRefKind::Indirect);
        }
    }

    #[test]
    fn test_repeated_pure_virtual_slots() {
        let (mut db, mut image) = setup(&[0x2000], &[0x2000, 0x2000, 0]);
        db.set_function_name(Address::new(0x2000), "_purecall").unwrap();
        image.set_disasm_line(Address::new(VTABLE), "dq offset _purecall");
        image.set_disasm_line(Address::new(VTABLE + 8), "dq offset _purecall");
        let options = PopulateOptions::default().with_pure_virtual_marker("_purecall");

        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &options).unwrap();
        assert!(report.is_clean());
        assert_eq!(db.member_at("CFoo_vftable", 0).unwrap().name(), "_purecall");
        assert_eq!(db.member_at("CFoo_vftable", 8).unwrap().name(), "_purecall_8");
    }

    #[test]
    fn test_stop_address() {
        let (mut db, mut image) = setup(&[0x1000, 0x1010], &[0x1000, 0x1010, 0x1000]);
        let options = PopulateOptions::default().with_stop_address(Address::new(VTABLE + 0x10));

        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &options).unwrap();
        assert_eq!(report.stop, StopReason::StopAddress);
        assert_eq!(report.slots.len(), 2);
    }

    #[test]
    fn test_pure_virtual_slot_survives_ignore_list() {
        let (mut db, mut image) = setup(&[0x1000, 0x2000], &[0x1000, 0x2000, 0x2000, 0]);
        image.set_disasm_line(Address::new(VTABLE + 8), "dq offset _purecall");
        image.set_disasm_line(Address::new(VTABLE + 0x10), "dq offset sub_2000");
        let options = PopulateOptions::default()
            .with_ignore_addresses(vec![Address::new(0x2000)])
            .with_pure_virtual_marker("_purecall");

        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &options).unwrap();

        assert_eq!(report.slots[1].status, SlotStatus::Written);
        assert_eq!(report.slots[2].status, SlotStatus::SkippedIgnored);
        // the shared stub is not claimed by the class
        let pure = db.member_at("CFoo_vftable", 8).unwrap();
        assert_eq!(pure.name(), "sub_2000");
        assert_eq!(db.function_name(Address::new(0x2000)).as_deref(), Some("sub_2000"));
        let xrefs = db.xrefs_from(&MemberRef::new("CFoo_vftable", 8));
        assert_eq!(xrefs[0].to(), &XRefTarget::Address(Address::new(0x2000)));
        assert!(db.member_at("CFoo_vftable", 0x10).is_none());
    }

    #[test]
    fn test_fix_userpurge() {
        let (mut db, _) = setup(&[], &[]);
        let mut sig = thiscall_sig(TypeInfo::named_ptr("CFoo"));
        sig.cc = CallingConv::Userpurge;
        sig.ret_location = Some("eax".to_string());
        sig.params[0].location = Some("ecx".to_string());
        db.add_function(Address::new(0x1000), None, Some(sig)).unwrap();

        assert!(fix_userpurge(&mut db, Address::new(0x1000)).unwrap());
        let fixed = db.function_signature(Address::new(0x1000)).unwrap();
        assert_eq!(fixed.cc, CallingConv::Thiscall);
        assert!(fixed.params.iter().all(|p| p.location.is_none()));
        assert!(fixed.ret_location.is_none());

        // already standard
        assert!(!fix_userpurge(&mut db, Address::new(0x1000)).unwrap());
        assert!(!fix_userpurge(&mut db, Address::new(0x9999)).unwrap());
    }

    #[test]
    fn test_update_func_this() {
        let (mut db, _) = setup(&[], &[]);
        db.add_function(Address::new(0x1000), None, Some(thiscall_sig(TypeInfo::Primitive(PrimitiveType::I32))))
            .unwrap();
        let cdecl = FuncSignature::new(TypeInfo::Void, CallingConv::Cdecl, vec![FuncParam::new(None, TypeInfo::Void)]);
        db.add_function(Address::new(0x2000), None, Some(cdecl)).unwrap();

        let this = TypeInfo::named_ptr("CFoo");
        assert!(update_func_this(&mut db, Address::new(0x1000), Some(&this)).unwrap());
        let sig = db.function_signature(Address::new(0x1000)).unwrap();
        assert_eq!(sig.params[0].name.as_deref(), Some("this"));
        assert_eq!(sig.params[0].ty, this);

        assert!(!update_func_this(&mut db, Address::new(0x2000), Some(&this)).unwrap());
    }

    #[test]
    fn test_slot_type_follows_prototype() {
        let (mut db, mut image) = setup(&[], &[0x1000, 0]);
        db.add_function(Address::new(0x1000), None, Some(thiscall_sig(TypeInfo::Primitive(PrimitiveType::I32))))
            .unwrap();

        populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &PopulateOptions::default())
            .unwrap();

        let ty = db.member_at("CFoo_vftable", 0).unwrap().type_info().unwrap().clone();
        assert_eq!(ty.to_string(), "int (__thiscall *)(CFoo *this, int a2)");
    }

    #[test]
    fn test_without_decompiler_uses_placeholder() {
        let (db, mut image) = setup(&[0x1000], &[0x1000, 0]);
        let mut db = db.with_decompiler(false);

        let options = PopulateOptions::default();
        populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &options).unwrap();
        let ty = db.member_at("CFoo_vftable", 0).unwrap().type_info().unwrap().clone();
        assert_eq!(ty, make_funcptr(Some(&TypeInfo::named_ptr("CFoo"))));
        assert_eq!(ty.to_string(), "void (*)(CFoo *)");
    }

    #[test]
    fn test_dummy_members() {
        let (mut db, mut image) = setup(&[0x1000, 0x1010], &[0x1000, 0x1010, 0]);
        let options = PopulateOptions::default().with_dummy_members(true);

        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &options).unwrap();
        assert_eq!(db.member_at("CFoo_vftable", 0).unwrap().name(), "dummy_1");
        assert_eq!(db.member_at("CFoo_vftable", 8).unwrap().name(), "CFoo::sub_1000");
        assert_eq!(db.member_at("CFoo_vftable", 0x10).unwrap().name(), "dummy_2");
        assert_eq!(report.vtable_size, 0x20);
    }

    #[test]
    fn test_duplicate_slot_is_reported_and_walk_continues() {
        let (mut db, mut image) = setup(&[0x1000, 0x1010], &[0x1000, 0x1000, 0x1010, 0]);

        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &PopulateOptions::default())
            .unwrap();
        assert!(matches!(report.slots[1].status, SlotStatus::Failed(_)));
        assert_eq!(report.slots[2].status, SlotStatus::Written);
        assert!(!report.is_clean());
        assert_eq!(db.member_at("CFoo_vftable", 0x10).unwrap().name(), "CFoo::sub_1010");
    }

    #[test]
    fn test_head_label() {
        let (mut db, mut image) = setup(&[0x1000], &[0x1000, 0]);
        let options = PopulateOptions::default().with_this_type(TypeInfo::named_ptr("CBase"));
        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &options).unwrap();
        assert_eq!(report.head_name.as_deref(), Some("CFoo::vftable::CBase"));

        // a user-named head is kept unless forced
        db.set_name_at(Address::new(VTABLE), "g_fooTable").unwrap();
        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &options).unwrap();
        assert!(report.head_name.is_none());
        assert_eq!(db.name_at(Address::new(VTABLE)).as_deref(), Some("g_fooTable"));

        let forced = options.clone().with_force_rename(true).with_parent_name("CFoo");
        let report = populate(&mut db, &mut image, "CFoo_vftable", Address::new(VTABLE), "CFoo", &forced).unwrap();
        assert_eq!(report.head_name.as_deref(), Some("CFoo::vftable"));
    }

    #[test]
    fn test_classify_slot() {
        let (db, image) = setup(&[0x1000], &[0x1000, 0x4242]);
        let filter = SlotFilter::default();

        assert_eq!(
            classify_slot(&image, &db, Address::new(VTABLE), &filter),
            SlotClass::Function {
                func: Address::new(0x1000),
                next: Address::new(VTABLE + 8),
                pure_virtual: false
            }
        );
        assert_eq!(
            classify_slot(&image, &db, Address::new(VTABLE + 8), &filter),
            SlotClass::Stop(StopReason::NotFunction)
        );
        assert_eq!(
            classify_slot(&image, &db, Address::new(0xdead_0000), &filter),
            SlotClass::Stop(StopReason::NotFunction)
        );
    }

    #[test]
    fn test_missing_vtable_struct() {
        let (mut db, mut image) = setup(&[], &[]);
        let err = populate(&mut db, &mut image, "CNope_vftable", Address::new(VTABLE), "CNope", &PopulateOptions::default());
        assert!(matches!(err, Err(LayoutError::NotFound(_))));
    }
}
