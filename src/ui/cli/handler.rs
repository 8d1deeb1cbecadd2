// Wed Jan 15 2026 - Alex

use super::args::{
    AddBaseclassArgs, AddFunctionArgs, AnnotateArgs, Args, Command, CreateClassArgs, ImportArgs, MakeVtableArgs, OverridesArgs,
    RenameOverrideArgs, ShowArgs,
};
use crate::config::Config;
use crate::cpp::{overridden_func_names, rename_override, SlotStatus};
use crate::engine::Session;
use crate::memory::Address;
use crate::output::DeclFormatter;
use crate::structure::TypeDatabase;
use crate::symbol::naming;
use crate::utils::LoggingUtils;
use anyhow::{bail, Context};
use colored::Colorize;
use log::LevelFilter;
use std::path::Path;

/// `--log-level` wins, then `-v`, then the config.
fn log_filter(args: &Args, config: &Config) -> LevelFilter {
    match (&args.log_level, args.verbose) {
        (Some(level), _) => LoggingUtils::level_from_str(level),
        (None, 0) => LoggingUtils::level_from_str(&config.log_level),
        (None, verbose) => LoggingUtils::level_from_verbosity(verbose),
    }
}

/// Struct named by the identifier under `column`: the full qualified name
/// when it is a struct, else its nearest enclosing scope that is.
fn struct_under_cursor(db: &dyn TypeDatabase, line: &str, column: usize) -> Option<String> {
    let mut name = naming::find_cpp_name_in_line(line, column)?;
    loop {
        if db.get_struct(&name).is_some() {
            return Some(name);
        }
        let pos = name.rfind(naming::VTABLE_DELIMITER)?;
        name.truncate(pos);
    }
}

pub struct CommandHandler {
    config: Config,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn execute(mut self, args: Args) -> anyhow::Result<()> {
        if let Some(path) = &args.config {
            self.config = Config::load(path).with_context(|| format!("Couldn't load config {:?}", path))?;
        }
        if args.no_color {
            colored::control::set_override(false);
        }
        self.setup_logging(&args);

        let session = args.session.as_path();
        match args.command {
            Command::Import(import_args) => self.handle_import(session, import_args),
            Command::AddFunction(func_args) => self.handle_add_function(session, func_args),
            Command::Annotate(annotate_args) => self.handle_annotate(session, annotate_args),
            Command::CreateClass(class_args) => self.handle_create_class(session, class_args),
            Command::MakeVtable(vtable_args) => self.handle_make_vtable(session, vtable_args),
            Command::AddBaseclass(base_args) => self.handle_add_baseclass(session, base_args),
            Command::RenameOverride(rename_args) => self.handle_rename_override(session, rename_args),
            Command::Overrides(overrides_args) => self.handle_overrides(session, overrides_args),
            Command::Show(show_args) => self.handle_show(session, show_args),
        }
    }

    fn setup_logging(&self, args: &Args) {
        LoggingUtils::init(log_filter(args, &self.config));
    }

    fn open(&self, path: &Path) -> anyhow::Result<Session> {
        Session::load(path).with_context(|| format!("Couldn't open session {:?} (run `import` first)", path))
    }

    fn store(&self, path: &Path, session: &Session) -> anyhow::Result<()> {
        session.save(path).with_context(|| format!("Couldn't write session {:?}", path))
    }

    fn handle_import(&self, path: &Path, args: ImportArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;
        if path.exists() && !args.force {
            bail!("Session {:?} already exists, pass --force to replace it", path);
        }

        println!("{}", "Importing binary...".cyan());
        let session = Session::import_binary(&args.binary)
            .with_context(|| format!("Couldn't import {:?}", args.binary))?;
        println!("  Segments: {}", session.image.segments().len());
        println!("  Functions: {}", session.db.symbols().functions().count());
        self.store(path, &session)?;
        println!("{} {:?}", "Session written to".green(), path);
        Ok(())
    }

    fn handle_add_function(&self, path: &Path, args: AddFunctionArgs) -> anyhow::Result<()> {
        let mut session = self.open(path)?;
        let ea = Address::new(args.address);
        session
            .add_function(ea, args.name.as_deref(), args.signature.as_deref())
            .with_context(|| format!("Couldn't add function at {}", ea))?;
        println!("{} {}", "Function added at".green(), ea);
        self.store(path, &session)
    }

    fn handle_annotate(&self, path: &Path, args: AnnotateArgs) -> anyhow::Result<()> {
        let mut session = self.open(path)?;
        session.annotate(Address::new(args.address), &args.line);
        self.store(path, &session)
    }

    fn handle_create_class(&self, path: &Path, args: CreateClassArgs) -> anyhow::Result<()> {
        let mut session = self.open(path)?;
        let created = session
            .composer(&self.config)
            .create_class(&args.name, args.vtable, args.parent.as_deref())
            .with_context(|| format!("Couldn't create class {}", args.name))?;
        if created {
            println!("{} {}", "Created".green(), args.name);
        } else {
            println!("{} {} already exists", "Note:".yellow(), args.name);
        }
        self.store(path, &session)
    }

    fn handle_make_vtable(&self, path: &Path, args: MakeVtableArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;
        let mut session = self.open(path)?;

        let mut config = self.config.clone();
        config.ignore_functions.extend(args.ignore.iter().copied());

        let report = session
            .composer(&config)
            .make_vtable(
                &args.class,
                Address::new(args.start),
                args.stop.map(Address::new),
                args.offset,
                args.parent.as_deref(),
                args.add_func_this(),
            )
            .with_context(|| format!("Couldn't build the vtable of {}", args.class))?;

        println!("{} {}", "Vtable".cyan(), report.vtable_struct);
        for slot in &report.slots {
            let status = match &slot.status {
                SlotStatus::Written => "ok".green(),
                SlotStatus::SkippedIgnored => "ignored".yellow(),
                SlotStatus::Failed(reason) => format!("failed: {}", reason).as_str().red(),
            };
            println!("  +0x{:<4X} {} {:<40} {}", slot.offset, slot.function, slot.name, status);
        }
        if let Some(head) = &report.head_name {
            println!("  Label: {}", head);
        }
        println!("  Size: 0x{:X} ({:?})", report.vtable_size, report.stop);
        self.store(path, &session)
    }

    fn handle_add_baseclass(&self, path: &Path, args: AddBaseclassArgs) -> anyhow::Result<()> {
        let mut session = self.open(path)?;
        if !session.composer(&self.config).add_baseclass(&args.class, &args.base, args.offset) {
            bail!("Couldn't add {} to {} at 0x{:X}", args.base, args.class, args.offset);
        }
        println!("{} {} <- {} at 0x{:X}", "Added".green(), args.class, args.base, args.offset);
        self.store(path, &session)
    }

    fn handle_rename_override(&self, path: &Path, args: RenameOverrideArgs) -> anyhow::Result<()> {
        let mut session = self.open(path)?;
        let renamed = rename_override(&mut session.db, &args.union, args.offset, &args.name, args.force)
            .with_context(|| format!("Couldn't rename overrides of {}+0x{:X}", args.union, args.offset))?;

        if renamed.is_empty() {
            println!("{}", "Nothing to rename".yellow());
        }
        for func in &renamed {
            println!("  {} {} -> {}", func.address, func.old_name, func.new_name.as_str().green());
        }
        self.store(path, &session)
    }

    fn handle_overrides(&self, path: &Path, args: OverridesArgs) -> anyhow::Result<()> {
        let session = self.open(path)?;
        let found = overridden_func_names(&session.db, &args.union, args.offset, args.all);
        if found.is_empty() {
            println!("{}", "No implementations found".yellow());
        }
        for func in &found {
            println!("  {:<24} {:<32} {}", func.class_name.as_str().cyan(), func.vtable_struct, func.func_name);
        }
        Ok(())
    }

    fn handle_show(&self, path: &Path, args: ShowArgs) -> anyhow::Result<()> {
        let session = self.open(path)?;
        let mut names = args.names;
        if let (Some(line), Some(column)) = (&args.line, args.column) {
            match struct_under_cursor(&session.db, line, column) {
                Some(name) => names.push(name),
                None => bail!("No struct named at column {} of '{}'", column, line),
            }
        }
        if names.is_empty() {
            names = session.db.structs().map(|s| s.name().to_string()).collect();
        }
        for name in &names {
            if session.db.get_struct(name).is_none() {
                eprintln!("{} no struct named {}", "Warning:".yellow(), name);
            }
        }

        let formatter = DeclFormatter::new().with_offsets(!args.no_offsets);
        println!("{}", formatter.format_many(&session.db, &names));
        Ok(())
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}
