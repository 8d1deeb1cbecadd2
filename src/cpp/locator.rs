// Tue Jan 20 2026 - Alex

use crate::cpp::{classify_member, ChainLink, LayoutError, MemberKind, VtableOwnership};
use crate::structure::{Member, TypeDatabase};
use log::debug;
use std::collections::HashSet;

fn member_in(db: &dyn TypeDatabase, struct_name: &str, offset: u64) -> Result<Member, LayoutError> {
    db.member_at(struct_name, offset)
        .cloned()
        .ok_or_else(|| LayoutError::NotFound(format!("no member of {} at 0x{:X}", struct_name, offset)))
}

fn base_struct_of(db: &dyn TypeDatabase, member: &Member) -> Result<String, LayoutError> {
    match classify_member(db, member) {
        MemberKind::BaseClassSubobject => member
            .substruct_name()
            .map(str::to_string)
            .ok_or_else(|| LayoutError::NotFound(member.name().to_string())),
        kind => Err(LayoutError::NotFound(format!(
            "'{}' at 0x{:X} is a {}, not a base class",
            member.name(),
            member.offset(),
            kind
        ))),
    }
}

fn enter(visited: &mut HashSet<String>, owner: &str) -> Result<(), LayoutError> {
    if visited.insert(owner.to_string()) {
        Ok(())
    } else {
        Err(LayoutError::InvalidInput(format!("base class cycle through {}", owner)))
    }
}

/// Finds the vtable pointer that sits at `target_offset` of `struct_name`,
/// descending through base-class sub-objects.
pub fn find_vtable_ownership(
    db: &dyn TypeDatabase,
    struct_name: &str,
    target_offset: u64,
) -> Result<VtableOwnership, LayoutError> {
    if db.get_struct(struct_name).is_none() {
        return Err(LayoutError::NotFound(struct_name.to_string()));
    }

    let mut owner = struct_name.to_string();
    let mut visited = HashSet::new();
    enter(&mut visited, &owner)?;
    let mut chain = Vec::new();
    let mut member = member_in(db, &owner, target_offset)?;
    let mut current_offset = member.offset();

    while current_offset < target_offset {
        owner = base_struct_of(db, &member)?;
        enter(&mut visited, &owner)?;
        let relative = target_offset - current_offset;
        chain.push(ChainLink::new(&owner, relative));
        member = member_in(db, &owner, relative)?;
        current_offset = current_offset.saturating_add(member.offset());
    }

    if current_offset != target_offset {
        return Err(LayoutError::NotFound(format!(
            "{} has no member starting at 0x{:X}",
            struct_name, target_offset
        )));
    }

    loop {
        let kind = classify_member(db, &member);
        if kind.is_vtable_pointer() {
            debug!(
                "vtable of {}+0x{:X} is {}.{} via {} bases",
                struct_name,
                target_offset,
                owner,
                member.name(),
                chain.len()
            );
            return Ok(VtableOwnership { member, kind, owner, chain });
        }
        owner = base_struct_of(db, &member)?;
        enter(&mut visited, &owner)?;
        chain.push(ChainLink::new(&owner, 0));
        member = member_in(db, &owner, 0)?;
    }
}
