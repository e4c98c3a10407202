//! Host-level module resolution.
//!
//! The loader never touches the platform loader directly. It asks a
//! [`ModuleHost`] to open a module reference and then asks the opened
//! [`GrammarModule`] to invoke an entry point. [`NativeHost`] is the real
//! implementation; tests substitute in-memory hosts.

use std::collections::HashMap;
use std::fmt;

use libloading::Library;
use tree_sitter::Language;
use tree_sitter_language::LanguageFn;

use crate::descriptor::ModuleRef;
use crate::handle::{LanguageTable, TreeSitterTable};

/// Signature of a grammar entry point: `const TSLanguage *tree_sitter_<name>(void)`.
pub type RawEntryPoint = unsafe extern "C" fn() -> *const ();

/// What happened when an entry point was looked up and called.
pub enum Invocation {
    /// The module exports no symbol with that name.
    Missing,
    /// The entry point ran and returned a null table.
    Null,
    Table(Box<dyn LanguageTable>),
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Missing => f.write_str("Missing"),
            Invocation::Null => f.write_str("Null"),
            Invocation::Table(table) => write!(f, "Table(abi={})", table.abi_version()),
        }
    }
}

/// A resolved module, ready to have one entry point invoked.
pub trait GrammarModule: Send {
    /// Consumes the module: whatever the table needs to stay valid moves
    /// into it, everything else is released.
    fn invoke(self: Box<Self>, entry_point: &str) -> Invocation;
}

/// Capability to resolve module references. Must be shareable with a load
/// helper thread when a load budget is configured.
pub trait ModuleHost: Send + Sync {
    /// Resolve `module`, or describe why it does not resolve.
    fn open(&self, module: &ModuleRef) -> Result<Box<dyn GrammarModule>, String>;
}

/// Resolves modules through the platform dynamic loader and a table of
/// entry points linked into the binary.
#[derive(Default, Clone)]
pub struct NativeHost {
    linked: HashMap<String, LanguageFn>,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a statically linked entry point resolvable under `entry_point`.
    pub fn link(&mut self, entry_point: impl Into<String>, language: LanguageFn) {
        self.linked.insert(entry_point.into(), language);
    }

    pub fn with_linked(mut self, entry_point: impl Into<String>, language: LanguageFn) -> Self {
        self.link(entry_point, language);
        self
    }

    pub fn is_linked(&self, entry_point: &str) -> bool {
        self.linked.contains_key(entry_point)
    }

    pub fn linked_entry_points(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.linked.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for NativeHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHost")
            .field("linked", &self.linked_entry_points())
            .finish()
    }
}

impl ModuleHost for NativeHost {
    fn open(&self, module: &ModuleRef) -> Result<Box<dyn GrammarModule>, String> {
        match module {
            ModuleRef::Library(path) => {
                // SAFETY: loading a grammar runs its initializers. Grammar
                // modules are plain data tables plus a getter, which is the
                // contract every module under test is expected to follow.
                let library = unsafe { Library::new(path) }
                    .map_err(|err| format!("{}: {err}", path.display()))?;
                Ok(Box::new(DynamicModule { library }))
            }
            ModuleRef::Linked => Ok(Box::new(LinkedModule {
                linked: self.linked.clone(),
            })),
        }
    }
}

struct DynamicModule {
    library: Library,
}

impl GrammarModule for DynamicModule {
    fn invoke(self: Box<Self>, entry_point: &str) -> Invocation {
        let DynamicModule { library } = *self;
        // SAFETY: the symbol is assumed to have the `tree_sitter_<name>`
        // signature. There is no way to check a C symbol's type at runtime.
        let lookup = unsafe { library.get::<RawEntryPoint>(entry_point.as_bytes()) };
        let raw: RawEntryPoint = match lookup {
            Ok(symbol) => *symbol,
            Err(_) => return Invocation::Missing,
        };
        // SAFETY: `raw` was resolved from this library and has the entry
        // point signature.
        let language = unsafe { LanguageFn::from_raw(raw) };
        instantiate(language, Some(library))
    }
}

struct LinkedModule {
    linked: HashMap<String, LanguageFn>,
}

impl GrammarModule for LinkedModule {
    fn invoke(self: Box<Self>, entry_point: &str) -> Invocation {
        match self.linked.get(entry_point) {
            Some(language) => instantiate(*language, None),
            None => Invocation::Missing,
        }
    }
}

/// Call the entry point once to rule out a null table, then build the
/// runtime `Language` from it. Entry points are idempotent, so the second
/// call inside `Language::new` yields the same table.
fn instantiate(language: LanguageFn, library: Option<Library>) -> Invocation {
    let raw = language.into_raw();
    // SAFETY: entry points take no arguments and only return a pointer to
    // static data.
    let table = unsafe { raw() };
    if table.is_null() {
        return Invocation::Null;
    }
    let language = Language::new(language);
    Invocation::Table(Box::new(TreeSitterTable::new(language, library)))
}
