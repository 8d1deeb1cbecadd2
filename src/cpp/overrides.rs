// Tue Jan 20 2026 - Alex

use crate::cpp::{is_vtable_struct, LayoutError, OverriddenFunc, RenamedFunction};
use crate::structure::TypeDatabase;
use crate::symbol::naming;
use log::{debug, warn};

/// Lists, for every class view of `union_name`, the member sitting at
/// `offset` of that view's vtable.
///
/// Views without a vtable struct or too short to reach `offset` are left
/// out. Slots that are not function pointers only show up with
/// `include_non_funcs`.
pub fn overridden_func_names(
    db: &dyn TypeDatabase,
    union_name: &str,
    offset: u64,
    include_non_funcs: bool,
) -> Vec<OverriddenFunc> {
    let union = match db.get_struct(union_name) {
        Some(union) if union.is_union() => union,
        _ => return Vec::new(),
    };

    let mut found = Vec::new();
    for view in union.members() {
        debug!("Trying {}", view.name());
        if view.name() == naming::INTERFACE_VTABLE_NAME {
            continue;
        }
        let vtable = match db.member_struct(union_name, view.offset()) {
            Some(vtable) if is_vtable_struct(vtable) && !vtable.is_union() => vtable,
            _ => continue,
        };
        if vtable.max_offset() <= offset {
            continue;
        }
        let slot = match vtable.member_at(offset) {
            Some(slot) => slot,
            None => continue,
        };
        let is_func = slot.type_info().map(|t| t.is_funcptr()).unwrap_or(false);
        if !is_func && !include_non_funcs {
            continue;
        }
        found.push(OverriddenFunc {
            class_name: view.name().to_string(),
            vtable_struct: vtable.name().to_string(),
            offset: slot.offset(),
            func_name: slot.name().to_string(),
        });
    }
    found
}

/// Gives every implementation of the slot at `offset` the local name
/// `new_name`, keeping each one's class qualifier.
///
/// Only analyzer-named (`sub_`) implementations are touched unless `force`
/// is set. The vtable slot member is renamed along with the function.
pub fn rename_override(
    db: &mut dyn TypeDatabase,
    union_name: &str,
    offset: u64,
    new_name: &str,
    force: bool,
) -> Result<Vec<RenamedFunction>, LayoutError> {
    match db.get_struct(union_name) {
        Some(union) if union.is_union() => {}
        Some(_) => return Err(LayoutError::InvalidInput(format!("{} is not a union", union_name))),
        None => return Err(LayoutError::NotFound(union_name.to_string())),
    }
    if new_name.is_empty() || new_name.contains(naming::VTABLE_DELIMITER) {
        return Err(LayoutError::InvalidInput(format!("'{}' is not a local name", new_name)));
    }

    let mut renamed = Vec::new();
    for slot in overridden_func_names(db, union_name, offset, false) {
        let local = naming::local_name(&slot.func_name);
        if local == new_name || !(force || naming::is_anonymous_name(local)) {
            continue;
        }
        let address = match db.function_by_name(&slot.func_name) {
            Some(address) => address,
            None => {
                debug!("{} has no function behind it", slot.func_name);
                continue;
            }
        };

        let qualified = naming::replace_local_name(&slot.func_name, new_name);
        debug!("{} -> {}", address, qualified);
        if let Err(err) = db.set_function_name(address, &qualified) {
            warn!("Couldn't rename {} at {}: {}", slot.func_name, address, err);
            continue;
        }
        if let Err(err) = db.rename_member(&slot.vtable_struct, slot.offset, &qualified) {
            warn!("Couldn't rename slot {}+0x{:X}: {}", slot.vtable_struct, slot.offset, err);
        }
        renamed.push(RenamedFunction {
            class_name: slot.class_name,
            address,
            old_name: slot.func_name,
            new_name: qualified,
        });
    }
    Ok(renamed)
}
