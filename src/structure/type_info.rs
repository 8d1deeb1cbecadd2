// Tue Jan 13 2026 - Alex

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeInfo {
    Void,
    Primitive(PrimitiveType),
    Pointer(Box<TypeInfo>),
    Array(Box<TypeInfo>, usize),
    /// A struct or union of the database, by name.
    Named(String),
    Function(FuncSignature),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallingConv {
    Unknown,
    Cdecl,
    Stdcall,
    Thiscall,
    Fastcall,
    Usercall,
    /// Callee-cleanup with register arguments; decompilers emit it when they
    /// cannot match `this` passing to a standard convention.
    Userpurge,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncParam {
    pub name: Option<String>,
    pub ty: TypeInfo,
    /// Explicit argument location, e.g. `ecx` from `@<ecx>`.
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncSignature {
    pub ret: Box<TypeInfo>,
    pub cc: CallingConv,
    pub params: Vec<FuncParam>,
    pub ret_location: Option<String>,
}

impl TypeInfo {
    pub fn named(name: &str) -> Self {
        Self::Named(name.to_string())
    }

    pub fn pointer_to(inner: TypeInfo) -> Self {
        Self::Pointer(Box::new(inner))
    }

    pub fn named_ptr(name: &str) -> Self {
        Self::pointer_to(Self::named(name))
    }

    /// Byte size, resolving named types through `resolve`. Functions have none.
    pub fn size(&self, pointer_size: u64, resolve: &dyn Fn(&str) -> Option<u64>) -> Option<u64> {
        match self {
            Self::Void => Some(0),
            Self::Primitive(ty) => Some(ty.size()),
            Self::Pointer(_) => Some(pointer_size),
            Self::Array(elem, count) => elem.size(pointer_size, resolve).map(|s| s * *count as u64),
            Self::Named(name) => resolve(name),
            Self::Function(_) => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    pub fn is_funcptr(&self) -> bool {
        matches!(self, Self::Pointer(inner) if matches!(**inner, Self::Function(_)))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    pub fn pointee(&self) -> Option<&TypeInfo> {
        match self {
            Self::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Name of the struct this type embeds by value.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Name of the struct this type points at.
    pub fn pointee_struct_name(&self) -> Option<&str> {
        self.pointee().and_then(|p| p.struct_name())
    }

    pub fn as_function(&self) -> Option<&FuncSignature> {
        match self {
            Self::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Rewrites every reference to struct `old` so it follows a rename.
    pub fn retarget(&mut self, old: &str, new: &str) {
        match self {
            Self::Named(name) if name == old => *name = new.to_string(),
            Self::Pointer(inner) | Self::Array(inner, _) => inner.retarget(old, new),
            Self::Function(sig) => {
                sig.ret.retarget(old, new);
                for param in &mut sig.params {
                    param.ty.retarget(old, new);
                }
            }
            _ => {}
        }
    }

    /// C declarator for this type around `inner` (a name, or empty).
    pub fn declare(&self, inner: &str) -> String {
        match self {
            Self::Void => with_declarator("void", inner),
            Self::Primitive(ty) => with_declarator(ty.c_name(), inner),
            Self::Named(name) => with_declarator(name, inner),
            Self::Pointer(pointee) => match pointee.as_ref() {
                Self::Function(sig) => {
                    sig.render(&format!("({}*{})", sig.cc.prefix(), inner), false)
                }
                Self::Array(_, _) => pointee.declare(&format!("(*{})", inner)),
                _ => pointee.declare(&format!("*{}", inner)),
            },
            Self::Array(elem, count) => elem.declare(&format!("{}[{}]", inner, count)),
            Self::Function(sig) => sig.render(inner, true),
        }
    }
}

fn with_declarator(base: &str, inner: &str) -> String {
    if inner.is_empty() {
        base.to_string()
    } else {
        format!("{} {}", base, inner)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.declare(""))
    }
}

impl PrimitiveType {
    pub fn size(self) -> u64 {
        match self {
            Self::U8 | Self::I8 | Self::Bool => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    pub fn c_name(self) -> &'static str {
        match self {
            Self::U8 => "unsigned char",
            Self::U16 => "unsigned short",
            Self::U32 => "unsigned int",
            Self::U64 => "unsigned __int64",
            Self::I8 => "char",
            Self::I16 => "short",
            Self::I32 => "int",
            Self::I64 => "__int64",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Bool => "bool",
        }
    }

    pub fn from_c_name(name: &str) -> Option<Self> {
        let ty = match name {
            "unsigned char" | "uint8_t" | "_BYTE" | "BYTE" => Self::U8,
            "unsigned short" | "uint16_t" | "_WORD" | "WORD" => Self::U16,
            "unsigned int" | "unsigned" | "uint32_t" | "_DWORD" | "DWORD" => Self::U32,
            "unsigned __int64" | "unsigned long long" | "uint64_t" | "_QWORD" | "QWORD" => Self::U64,
            "char" | "signed char" | "int8_t" => Self::I8,
            "short" | "int16_t" => Self::I16,
            "int" | "signed int" | "signed" | "int32_t" | "long" => Self::I32,
            "__int64" | "long long" | "int64_t" => Self::I64,
            "float" => Self::F32,
            "double" => Self::F64,
            "bool" | "_BOOL1" => Self::Bool,
            _ => return None,
        };
        Some(ty)
    }
}

impl CallingConv {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Cdecl => "__cdecl",
            Self::Stdcall => "__stdcall",
            Self::Thiscall => "__thiscall",
            Self::Fastcall => "__fastcall",
            Self::Usercall => "__usercall",
            Self::Userpurge => "__userpurge",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let cc = match keyword {
            "__cdecl" => Self::Cdecl,
            "__stdcall" => Self::Stdcall,
            "__thiscall" => Self::Thiscall,
            "__fastcall" => Self::Fastcall,
            "__usercall" => Self::Usercall,
            "__userpurge" => Self::Userpurge,
            _ => return None,
        };
        Some(cc)
    }

    fn prefix(self) -> String {
        match self {
            Self::Unknown => String::new(),
            other => format!("{} ", other.keyword()),
        }
    }
}

impl FuncParam {
    pub fn new(name: Option<&str>, ty: TypeInfo) -> Self {
        Self {
            name: name.map(str::to_string),
            ty,
            location: None,
        }
    }
}

impl FuncSignature {
    pub fn new(ret: TypeInfo, cc: CallingConv, params: Vec<FuncParam>) -> Self {
        Self {
            ret: Box::new(ret),
            cc,
            params,
            ret_location: None,
        }
    }

    /// Renders `ret cc inner(params)`; `with_cc` is off when the convention
    /// already sits inside `inner` (function pointers).
    fn render(&self, inner: &str, with_cc: bool) -> String {
        let mut out = self.ret.declare("");
        if with_cc && self.cc != CallingConv::Unknown {
            out.push(' ');
            out.push_str(self.cc.keyword());
        }
        if !inner.is_empty() {
            out.push(' ');
            out.push_str(inner);
        }
        if let Some(loc) = &self.ret_location {
            out.push_str(&format!("@<{}>", loc));
        }
        let params = self
            .params
            .iter()
            .map(|p| {
                let mut text = p.ty.declare(p.name.as_deref().unwrap_or(""));
                if let Some(loc) = &p.location {
                    text.push_str(&format!("@<{}>", loc));
                }
                text
            })
            .join(", ");
        out.push('(');
        out.push_str(&params);
        out.push(')');
        out
    }
}

impl fmt::Display for FuncSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render("", true))
    }
}
