//! Loading and conformance checks for compiled tree-sitter grammar modules.
//!
//! A [`HarnessRegistry`] holds [`GrammarDescriptor`]s. Each run loads every
//! module through a [`Loader`], validates the resulting [`LanguageHandle`]
//! and collects one [`Verdict`] per descriptor into a [`Report`].

pub mod descriptor;
pub mod handle;
pub mod host;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod report;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use descriptor::{GrammarDescriptor, ModuleRef, default_entry_point};
pub use gramcheck_error::{Error, ErrorKind, Result};
pub use handle::{GrammarFacts, LanguageHandle, LanguageTable, TreeSitterTable};
pub use host::{GrammarModule, Invocation, ModuleHost, NativeHost, RawEntryPoint};
pub use loader::{LoadErrorKind, LoadResult, Loader, runtime_abi_range};
pub use manifest::{DEFAULT_MANIFEST, GrammarEntry, HarnessSection, Manifest, manifest_dir};
pub use registry::HarnessRegistry;
pub use report::{CheckRecord, EXIT_FAILURE, EXIT_SUCCESS, FailReason, Outcome, Report, Verdict};
pub use tree_sitter_language::LanguageFn;
pub use validator::{Check, validate};
