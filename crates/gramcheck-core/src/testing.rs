//! In-memory grammar modules for unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::descriptor::{ModuleRef, default_entry_point};
use crate::handle::LanguageTable;
use crate::host::{GrammarModule, Invocation, ModuleHost};

#[derive(Debug, Clone)]
pub enum FakeModule {
    Table { abi: usize, symbols: Option<usize> },
    Null,
    Hang(Duration),
    Panic,
}

impl FakeModule {
    pub fn table(abi: usize, symbols: usize) -> Self {
        FakeModule::Table {
            abi,
            symbols: Some(symbols),
        }
    }
}

struct FakeTable {
    abi: usize,
    symbols: Option<usize>,
}

impl LanguageTable for FakeTable {
    fn abi_version(&self) -> usize {
        self.abi
    }

    fn symbol_count(&self) -> Option<usize> {
        self.symbols
    }
}

struct Opened {
    symbol: String,
    module: FakeModule,
}

impl GrammarModule for Opened {
    fn invoke(self: Box<Self>, entry_point: &str) -> Invocation {
        if entry_point != self.symbol {
            return Invocation::Missing;
        }
        match self.module {
            FakeModule::Table { abi, symbols } => {
                Invocation::Table(Box::new(FakeTable { abi, symbols }))
            }
            FakeModule::Null => Invocation::Null,
            FakeModule::Hang(delay) => {
                std::thread::sleep(delay);
                Invocation::Null
            }
            FakeModule::Panic => panic!("grammar `{}` blew up", self.symbol),
        }
    }
}

/// Host whose modules live in memory. `with("barq", ..)` makes
/// `libbarq.so` resolvable and exporting `tree_sitter_barq`.
#[derive(Default)]
pub struct FakeHost {
    modules: HashMap<ModuleRef, (String, FakeModule)>,
    opens: AtomicUsize,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, module: FakeModule) -> Self {
        let reference = ModuleRef::Library(PathBuf::from(format!("lib{name}.so")));
        self.modules
            .insert(reference, (default_entry_point(name), module));
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ModuleHost for FakeHost {
    fn open(&self, module: &ModuleRef) -> Result<Box<dyn GrammarModule>, String> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.modules.get(module) {
            Some((symbol, fake)) => Ok(Box::new(Opened {
                symbol: symbol.clone(),
                module: fake.clone(),
            })),
            None => Err(format!("{module}: cannot open shared object file")),
        }
    }
}
