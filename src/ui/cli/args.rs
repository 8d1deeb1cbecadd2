// Wed Jan 15 2026 - Alex

use crate::memory::Address;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vtable-recon")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Rebuilds C++ class layouts and vtables from binary images", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Session file holding the type database and the image
    #[arg(short, long, global = true, default_value = "session.json")]
    pub session: PathBuf,

    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the config's log level
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a session from an ELF, PE or Mach-O file
    Import(ImportArgs),
    /// Mark a function start
    AddFunction(AddFunctionArgs),
    /// Attach disassembly text to an address, e.g. a vtable slot
    Annotate(AnnotateArgs),
    CreateClass(CreateClassArgs),
    MakeVtable(MakeVtableArgs),
    AddBaseclass(AddBaseclassArgs),
    /// Name every implementation of one vtable slot
    RenameOverride(RenameOverrideArgs),
    /// List the implementations of one vtable slot
    Overrides(OverridesArgs),
    /// Print structs as C declarations
    Show(ShowArgs),
}

fn hex_address(s: &str) -> Result<u64, String> {
    Address::parse(s)
        .map(u64::from)
        .ok_or_else(|| format!("'{}' is not a hex address", s))
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    #[arg(short, long)]
    pub binary: PathBuf,

    /// Replace an existing session file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct AddFunctionArgs {
    #[arg(value_parser = hex_address)]
    pub address: u64,

    #[arg(short, long)]
    pub name: Option<String>,

    /// C prototype, e.g. "int __thiscall f(CFoo *this)"
    #[arg(long)]
    pub signature: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AnnotateArgs {
    #[arg(value_parser = hex_address)]
    pub address: u64,

    pub line: String,
}

#[derive(Parser, Debug)]
pub struct CreateClassArgs {
    pub name: String,

    #[arg(long)]
    pub vtable: bool,

    #[arg(short, long)]
    pub parent: Option<String>,
}

#[derive(Parser, Debug)]
pub struct MakeVtableArgs {
    pub class: String,

    /// Address of the first slot
    #[arg(value_parser = hex_address)]
    pub start: u64,

    #[arg(long, value_parser = hex_address)]
    pub stop: Option<u64>,

    /// Offset of the vtable pointer inside the class
    #[arg(short, long, value_parser = hex_address, default_value = "0")]
    pub offset: u64,

    #[arg(short, long)]
    pub parent: Option<String>,

    /// Give the slot functions a typed `this`, whatever the config says
    #[arg(long, conflicts_with = "no_this")]
    pub this: bool,

    /// Leave function prototypes alone
    #[arg(long)]
    pub no_this: bool,

    /// Function addresses to skip, on top of the config's list
    #[arg(long, value_parser = hex_address)]
    pub ignore: Vec<u64>,
}

#[derive(Parser, Debug)]
pub struct AddBaseclassArgs {
    pub class: String,

    pub base: String,

    #[arg(short, long, value_parser = hex_address, default_value = "0")]
    pub offset: u64,
}

#[derive(Parser, Debug)]
pub struct RenameOverrideArgs {
    /// The vtable union
    pub union: String,

    #[arg(value_parser = hex_address)]
    pub offset: u64,

    pub name: String,

    /// Rename user-named implementations too
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct OverridesArgs {
    pub union: String,

    #[arg(value_parser = hex_address)]
    pub offset: u64,

    /// Include slots that aren't function pointers
    #[arg(long)]
    pub all: bool,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    pub names: Vec<String>,

    #[arg(long)]
    pub no_offsets: bool,

    /// Also show the struct named under `--column` of this listing line
    #[arg(long, requires = "column")]
    pub line: Option<String>,

    #[arg(long, requires = "line")]
    pub column: Option<usize>,
}

impl MakeVtableArgs {
    /// Explicit `this` choice, or None to follow the config.
    pub fn add_func_this(&self) -> Option<bool> {
        match (self.this, self.no_this) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

impl ImportArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.binary.exists() {
            return Err(format!("Binary does not exist: {:?}", self.binary));
        }
        Ok(())
    }
}

impl MakeVtableArgs {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(stop) = self.stop {
            if stop <= self.start {
                return Err(format!("--stop 0x{:X} must come after the start 0x{:X}", stop, self.start));
            }
        }
        Ok(())
    }
}
