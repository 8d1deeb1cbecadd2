// Mon Jan 19 2026 - Alex

//! Parser for the C declarations the database hands back as text: plain and
//! pointer types, function prototypes (with `@<reg>` locations) and function
//! pointers.

use crate::structure::type_info::{CallingConv, FuncParam, FuncSignature, PrimitiveType, TypeInfo};
use crate::structure::StructureError;
use once_cell::sync::Lazy;
use regex::Regex;

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@<(\w+)>\s*$").unwrap());
static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][\w:]*$").unwrap());
static FUNCPTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ret>.+?)\s*\(\s*(?P<cc>__\w+)?\s*\*\s*(?P<name>[A-Za-z_][\w:]*)?\s*\)\s*\((?P<params>.*)\)$").unwrap()
});

const TYPE_WORDS: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "bool", "unsigned", "signed",
    "__int64", "_BYTE", "_WORD", "_DWORD", "_QWORD", "_BOOL1", "const", "struct", "union",
];

/// Parses a type expression, with `is_known` telling which named structs exist.
pub fn parse_type(text: &str, is_known: &dyn Fn(&str) -> bool) -> Result<TypeInfo, StructureError> {
    parse_declaration(text, is_known).map(|(ty, _)| ty)
}

/// Parses a declaration and also returns the declared name, if any.
pub fn parse_declaration(
    text: &str,
    is_known: &dyn Fn(&str) -> bool,
) -> Result<(TypeInfo, Option<String>), StructureError> {
    let text = text.trim().trim_end_matches(';').trim();
    if text.is_empty() {
        return Err(StructureError::ParseError("empty declaration".to_string()));
    }

    if let Some(caps) = FUNCPTR_RE.captures(text) {
        let cc = match caps.name("cc") {
            Some(m) => CallingConv::from_keyword(m.as_str())
                .ok_or_else(|| StructureError::ParseError(format!("unknown calling convention '{}'", m.as_str())))?,
            None => CallingConv::Unknown,
        };
        let ret = parse_type(&caps["ret"], is_known)?;
        let params = parse_params(&caps["params"], is_known)?;
        let sig = FuncSignature::new(ret, cc, params);
        let name = caps.name("name").map(|m| m.as_str().to_string());
        return Ok((TypeInfo::pointer_to(TypeInfo::Function(sig)), name));
    }

    if text.ends_with(')') {
        let open = matching_open_paren(text)
            .ok_or_else(|| StructureError::ParseError(format!("unbalanced parentheses in '{}'", text)))?;
        return parse_prototype(&text[..open], &text[open + 1..text.len() - 1], is_known);
    }

    parse_object(text, is_known)
}

fn parse_prototype(
    head: &str,
    params: &str,
    is_known: &dyn Fn(&str) -> bool,
) -> Result<(TypeInfo, Option<String>), StructureError> {
    let (head, ret_location) = split_location(head);
    let tokens = tokenize(&head);

    let (ret_tokens, cc, name) = match tokens.iter().position(|t| CallingConv::from_keyword(t).is_some()) {
        Some(pos) => {
            let cc = CallingConv::from_keyword(&tokens[pos]).unwrap_or(CallingConv::Unknown);
            let rest = &tokens[pos + 1..];
            let name = match rest {
                [] => None,
                [single] if IDENT_RE.is_match(single) => Some(single.clone()),
                _ => return Err(StructureError::ParseError(format!("unexpected tokens after '{}'", tokens[pos]))),
            };
            (tokens[..pos].to_vec(), cc, name)
        }
        None => {
            let (ty_tokens, name) = split_trailing_name(&tokens);
            (ty_tokens, CallingConv::Unknown, name)
        }
    };

    let ret = parse_base(&ret_tokens, is_known)?;
    let mut sig = FuncSignature::new(ret, cc, parse_params(params, is_known)?);
    sig.ret_location = ret_location;
    Ok((TypeInfo::Function(sig), name))
}

fn parse_params(text: &str, is_known: &dyn Fn(&str) -> bool) -> Result<Vec<FuncParam>, StructureError> {
    let text = text.trim();
    if text.is_empty() || text == "void" {
        return Ok(Vec::new());
    }

    split_top_level(text)
        .iter()
        .map(|part| {
            let (part, location) = split_location(part);
            let (ty, name) = if part.contains('(') {
                parse_declaration(&part, is_known)?
            } else {
                parse_object(&part, is_known)?
            };
            Ok(FuncParam { name, ty, location })
        })
        .collect()
}

/// `type [*...] [name]` without any parentheses.
fn parse_object(text: &str, is_known: &dyn Fn(&str) -> bool) -> Result<(TypeInfo, Option<String>), StructureError> {
    let tokens = tokenize(text);
    let (ty_tokens, name) = split_trailing_name(&tokens);
    Ok((parse_base(&ty_tokens, is_known)?, name))
}

fn parse_base(tokens: &[String], is_known: &dyn Fn(&str) -> bool) -> Result<TypeInfo, StructureError> {
    let stars = tokens.iter().rev().take_while(|t| t.as_str() == "*").count();
    let words: Vec<&str> = tokens[..tokens.len() - stars]
        .iter()
        .map(String::as_str)
        .filter(|t| !matches!(*t, "const" | "struct" | "union" | "class"))
        .collect();

    if words.iter().any(|w| *w == "*") {
        return Err(StructureError::ParseError(format!("misplaced '*' in '{}'", tokens.join(" "))));
    }
    if words.is_empty() {
        return Err(StructureError::ParseError("missing type name".to_string()));
    }

    let joined = words.join(" ");
    let mut ty = if joined == "void" {
        TypeInfo::Void
    } else if let Some(prim) = PrimitiveType::from_c_name(&joined) {
        TypeInfo::Primitive(prim)
    } else if words.len() == 1 && IDENT_RE.is_match(&joined) && is_known(&joined) {
        TypeInfo::Named(joined)
    } else {
        return Err(StructureError::ParseError(format!("unknown type '{}'", joined)));
    };

    for _ in 0..stars {
        ty = TypeInfo::pointer_to(ty);
    }
    Ok(ty)
}

fn split_trailing_name(tokens: &[String]) -> (Vec<String>, Option<String>) {
    match tokens.split_last() {
        Some((last, rest))
            if !rest.is_empty()
                && IDENT_RE.is_match(last)
                && !TYPE_WORDS.contains(&last.as_str())
                && !matches!(rest.last().map(String::as_str), Some("struct" | "union" | "class")) =>
        {
            (rest.to_vec(), Some(last.clone()))
        }
        _ => (tokens.to_vec(), None),
    }
}

fn split_location(text: &str) -> (String, Option<String>) {
    match LOCATION_RE.captures(text) {
        Some(caps) => {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(text.len());
            (text[..start].trim().to_string(), Some(caps[1].to_string()))
        }
        None => (text.trim().to_string(), None),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.replace('*', " * ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn matching_open_paren(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(name: &str) -> bool {
        matches!(name, "CFoo" | "CFoo_vftable" | "CFoo::VFTABLES")
    }

    #[test]
    fn test_parse_plain_types() {
        assert_eq!(parse_type("int", &known).unwrap(), TypeInfo::Primitive(PrimitiveType::I32));
        assert_eq!(parse_type("unsigned int", &known).unwrap(), TypeInfo::Primitive(PrimitiveType::U32));
        assert_eq!(parse_type("CFoo *", &known).unwrap(), TypeInfo::named_ptr("CFoo"));
        assert_eq!(parse_type("struct CFoo*", &known).unwrap(), TypeInfo::named_ptr("CFoo"));
        assert_eq!(parse_type("CFoo::VFTABLES *", &known).unwrap(), TypeInfo::named_ptr("CFoo::VFTABLES"));
        assert!(parse_type("CMissing *", &known).is_err());
    }

    #[test]
    fn test_parse_function_pointer() {
        let ty = parse_type("void (*)(CFoo *)", &known).unwrap();
        assert!(ty.is_funcptr());
        assert_eq!(ty.to_string(), "void (*)(CFoo *)");

        let (ty, name) = parse_declaration("int (__thiscall *Draw)(CFoo *this, int a2)", &known).unwrap();
        assert_eq!(name.as_deref(), Some("Draw"));
        let sig = ty.pointee().and_then(TypeInfo::as_function).unwrap();
        assert_eq!(sig.cc, CallingConv::Thiscall);
        assert_eq!(sig.params[0].name.as_deref(), Some("this"));
    }

    #[test]
    fn test_parse_prototype_with_locations() {
        let ty = parse_type("int __userpurge@<eax>(CFoo *this@<ecx>, int a2)", &known).unwrap();
        let sig = ty.as_function().unwrap();
        assert_eq!(sig.cc, CallingConv::Userpurge);
        assert_eq!(sig.ret_location.as_deref(), Some("eax"));
        assert_eq!(sig.params[0].location.as_deref(), Some("ecx"));
        assert_eq!(sig.params[1].ty, TypeInfo::Primitive(PrimitiveType::I32));
    }

    #[test]
    fn test_parse_named_prototype() {
        let (ty, name) = parse_declaration("CFoo *__thiscall CFoo::Clone(CFoo *this);", &known).unwrap();
        assert_eq!(name.as_deref(), Some("CFoo::Clone"));
        let sig = ty.as_function().unwrap();
        assert_eq!(*sig.ret, TypeInfo::named_ptr("CFoo"));

        let ty = parse_type("void f(void)", &known).unwrap();
        assert!(ty.as_function().unwrap().params.is_empty());
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let text = "int (__thiscall *)(CFoo *this, int a2)";
        assert_eq!(parse_type(text, &known).unwrap().to_string(), text);
    }
}
