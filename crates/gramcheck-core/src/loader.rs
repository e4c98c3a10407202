//! Module loading: descriptor in, language handle or load failure out.
//!
//! The loader only checks existence and shape: the module resolves, the entry
//! point exists and returns a table, and the table's ABI version is one the
//! linked tree-sitter runtime can use at all. Whether that version satisfies a
//! descriptor's own floor is a conformance question left to the validator.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use strum_macros::{Display, IntoStaticStr};

use crate::descriptor::GrammarDescriptor;
use crate::handle::LanguageHandle;
use crate::host::{Invocation, ModuleHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum LoadErrorKind {
    /// The module reference does not resolve.
    ModuleNotFound,
    /// The module resolves but does not export the entry point.
    EntryPointMissing,
    /// The entry point ran and returned a null table.
    EntryPointReturnedNull,
    /// The table's ABI version is outside what the runtime supports.
    AbiMismatch,
    /// The load did not finish within the configured budget.
    LoadTimeout,
}

impl LoadErrorKind {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

#[derive(Debug)]
pub enum LoadResult {
    Loaded(LanguageHandle),
    Failed(LoadErrorKind, String),
}

impl LoadResult {
    fn failed(kind: LoadErrorKind, detail: impl Into<String>) -> Self {
        LoadResult::Failed(kind, detail.into())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadResult::Loaded(_))
    }

    pub fn error_kind(&self) -> Option<LoadErrorKind> {
        match self {
            LoadResult::Loaded(_) => None,
            LoadResult::Failed(kind, _) => Some(*kind),
        }
    }
}

/// ABI versions the linked tree-sitter runtime can consume.
pub fn runtime_abi_range() -> RangeInclusive<usize> {
    tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION..=tree_sitter::LANGUAGE_VERSION
}

pub struct Loader {
    host: Arc<dyn ModuleHost>,
    supported_abi: RangeInclusive<usize>,
    timeout: Option<Duration>,
}

impl Loader {
    pub fn new(host: Arc<dyn ModuleHost>) -> Self {
        Self {
            host,
            supported_abi: runtime_abi_range(),
            timeout: None,
        }
    }

    /// Bound each load by a wall-clock budget. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_supported_abi(mut self, range: RangeInclusive<usize>) -> Self {
        self.supported_abi = range;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn supported_abi(&self) -> &RangeInclusive<usize> {
        &self.supported_abi
    }

    pub fn load(&self, descriptor: &GrammarDescriptor) -> LoadResult {
        match self.timeout {
            None => load_with(self.host.as_ref(), descriptor, &self.supported_abi),
            Some(budget) => self.load_bounded(descriptor, budget),
        }
    }

    /// Run the load on a helper thread and stop waiting after `budget`.
    ///
    /// A hung module cannot be interrupted; its thread is left behind and
    /// whatever it eventually produces is dropped. A panic on the helper
    /// thread is re-raised on the caller's thread.
    fn load_bounded(&self, descriptor: &GrammarDescriptor, budget: Duration) -> LoadResult {
        let (tx, rx) = mpsc::channel();
        let host = Arc::clone(&self.host);
        let owned = descriptor.clone();
        let range = self.supported_abi.clone();

        let spawned = thread::Builder::new()
            .name(format!("gramcheck-load-{}", descriptor.name()))
            .spawn(move || {
                let result = load_with(host.as_ref(), &owned, &range);
                let _ = tx.send(result);
            });
        let worker = match spawned {
            Ok(worker) => worker,
            // No thread to bound the load with; fall back to loading inline.
            Err(_) => return load_with(self.host.as_ref(), descriptor, &self.supported_abi),
        };

        match rx.recv_timeout(budget) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => LoadResult::failed(
                LoadErrorKind::LoadTimeout,
                format!(
                    "load of {} did not finish within {}ms",
                    descriptor.module(),
                    budget.as_millis()
                ),
            ),
            Err(RecvTimeoutError::Disconnected) => match worker.join() {
                Err(payload) => std::panic::resume_unwind(payload),
                Ok(()) => LoadResult::failed(
                    LoadErrorKind::ModuleNotFound,
                    "load thread exited without a result",
                ),
            },
        }
    }
}

fn load_with(
    host: &dyn ModuleHost,
    descriptor: &GrammarDescriptor,
    supported_abi: &RangeInclusive<usize>,
) -> LoadResult {
    let module = match host.open(descriptor.module()) {
        Ok(module) => module,
        Err(detail) => return LoadResult::failed(LoadErrorKind::ModuleNotFound, detail),
    };

    let table = match module.invoke(descriptor.entry_point()) {
        Invocation::Table(table) => table,
        Invocation::Missing => {
            return LoadResult::failed(
                LoadErrorKind::EntryPointMissing,
                format!(
                    "{} does not export `{}`",
                    descriptor.module(),
                    descriptor.entry_point()
                ),
            );
        }
        Invocation::Null => {
            return LoadResult::failed(
                LoadErrorKind::EntryPointReturnedNull,
                format!("`{}` returned a null language", descriptor.entry_point()),
            );
        }
    };

    let abi = table.abi_version();
    if !supported_abi.contains(&abi) {
        return LoadResult::failed(
            LoadErrorKind::AbiMismatch,
            format!(
                "ABI version {abi} is outside the supported range {}..={}",
                supported_abi.start(),
                supported_abi.end()
            ),
        );
    }

    LoadResult::Loaded(LanguageHandle::new(table))
}
