// Mon Jan 19 2026 - Alex

//! Canonical names for everything the class reconstruction writes into the
//! database. These strings are matched by name elsewhere (and by people
//! reading the listing), so they must stay stable.

pub const VTABLE_POSTFIX: &str = "_vftable";
pub const VTABLE_FIELD_NAME: &str = "vfptr";
pub const VTABLE_DELIMITER: &str = "::";
pub const VTABLE_UNION_KEYWORD: &str = "VFTABLES";
pub const VTABLE_INSTANCE_KEYWORD: &str = "vftable";
pub const INTERFACE_VTABLE_NAME: &str = "INTERFACE";
pub const ANONYMOUS_PREFIX: &str = "sub_";
pub const ORIG_SUFFIX: &str = "_orig";
pub const DUMMY_MEMBER_NAME: &str = "dummy";

/// `Class::vftable`, or `Class::vftable::Parent` for a secondary table.
pub fn vtable_instance_name(class_name: &str, parent_name: Option<&str>) -> String {
    let mut name = format!("{}{}{}", class_name, VTABLE_DELIMITER, VTABLE_INSTANCE_KEYWORD);
    if let Some(parent) = parent_name {
        name.push_str(VTABLE_DELIMITER);
        name.push_str(parent);
    }
    name
}

pub fn base_member_name(base_name: &str, offset: u64) -> String {
    format!("{}_{:X}", base_name, offset)
}

pub fn class_vtable_struct_name(class_name: &str, vtable_offset: u64) -> String {
    if vtable_offset == 0 {
        return format!("{}{}", class_name, VTABLE_POSTFIX);
    }
    format!("{}_{:04X}{}", class_name, vtable_offset, VTABLE_POSTFIX)
}

pub fn class_vtable_field_name(_class_name: &str) -> &'static str {
    VTABLE_FIELD_NAME
}

pub fn class_vtables_field_name(child_name: &str) -> String {
    child_name.to_string()
}

pub fn orig_vtable_name(vtable_name: &str) -> String {
    format!("{}{}", vtable_name, ORIG_SUFFIX)
}

pub fn is_valid_vtable_name(member_name: &str) -> bool {
    member_name.contains(VTABLE_FIELD_NAME)
}

pub fn is_vtable_struct_name(struct_name: &str) -> bool {
    struct_name.contains(VTABLE_POSTFIX)
}

pub fn is_vtables_union_name(union_name: &str) -> bool {
    union_name.ends_with(VTABLE_UNION_KEYWORD)
}

/// True for names the analyzer generated itself and which may be replaced.
pub fn is_anonymous_name(name: &str) -> bool {
    name.starts_with(ANONYMOUS_PREFIX)
}

pub fn qualified_name(class_name: &str, local_name: &str) -> String {
    format!("{}{}{}", class_name, VTABLE_DELIMITER, local_name)
}

/// Last `::` segment of a qualified name.
pub fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit(VTABLE_DELIMITER)
        .next()
        .unwrap_or(qualified)
}

/// Swaps the last `::` segment, keeping every enclosing scope.
pub fn replace_local_name(qualified: &str, new_local: &str) -> String {
    match qualified.rfind(VTABLE_DELIMITER) {
        Some(pos) => format!("{}{}", &qualified[..pos + VTABLE_DELIMITER.len()], new_local),
        None => new_local.to_string(),
    }
}

fn is_cpp_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == ':' || c == '_'
}

/// Extracts the `::`-qualified identifier covering column `idx` of `line`.
pub fn find_cpp_name_in_line(line: &str, idx: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    if idx >= chars.len() || !is_cpp_name_char(chars[idx]) {
        return None;
    }

    let mut start = idx;
    while start > 0 && is_cpp_name_char(chars[start - 1]) {
        if chars[start - 1] == ':' {
            if start >= 2 && chars[start - 2] == ':' {
                start -= 2;
                continue;
            }
            break;
        }
        start -= 1;
    }

    let mut end = idx;
    while end < chars.len() && is_cpp_name_char(chars[end]) {
        if chars[end] == ':' {
            if end + 1 < chars.len() && chars[end + 1] == ':' {
                end += 2;
                continue;
            }
            break;
        }
        end += 1;
    }

    if end > start {
        Some(chars[start..end].iter().collect())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vtable_struct_name() {
        assert_eq!(class_vtable_struct_name("CFoo", 0), "CFoo_vftable");
        assert_eq!(class_vtable_struct_name("CFoo", 0x10), "CFoo_0010_vftable");
        assert_eq!(class_vtable_struct_name("CFoo", 0x12345), "CFoo_12345_vftable");
        assert_eq!(
            class_vtable_struct_name("CFoo", 0x10),
            class_vtable_struct_name("CFoo", 0x10)
        );
    }

    #[test]
    fn test_instance_and_member_names() {
        assert_eq!(vtable_instance_name("CFoo", None), "CFoo::vftable");
        assert_eq!(vtable_instance_name("CFoo", Some("CBar")), "CFoo::vftable::CBar");
        assert_eq!(base_member_name("CBar", 0x18), "CBar_18");
        assert_eq!(class_vtable_field_name("CFoo"), "vfptr");
    }

    #[test]
    fn test_markers() {
        assert!(is_vtable_struct_name("CFoo_0010_vftable"));
        assert!(is_vtable_struct_name("CFoo_vftable_orig"));
        assert!(!is_vtable_struct_name("CFoo"));
        assert!(is_vtables_union_name("CFoo::VFTABLES"));
        assert!(is_anonymous_name("sub_401000"));
        assert!(!is_anonymous_name("CFoo::sub_401000"));
    }

    #[test]
    fn test_local_name_replacement() {
        assert_eq!(local_name("A::B::sub_10"), "sub_10");
        assert_eq!(local_name("sub_10"), "sub_10");
        assert_eq!(replace_local_name("A::B::sub_10", "Draw"), "A::B::Draw");
        assert_eq!(replace_local_name("sub_10", "Draw"), "Draw");
    }

    #[test]
    fn test_find_cpp_name_in_line() {
        let line = "call    CFoo::Bar(void)";
        assert_eq!(find_cpp_name_in_line(line, 9), Some("CFoo::Bar".to_string()));
        assert_eq!(find_cpp_name_in_line(line, 15), Some("CFoo::Bar".to_string()));
        assert_eq!(find_cpp_name_in_line(line, 4), None);
        assert_eq!(find_cpp_name_in_line(line, 200), None);
    }
}
