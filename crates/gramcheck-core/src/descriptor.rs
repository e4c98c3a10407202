//! Static metadata identifying one grammar module under test.

use std::fmt;
use std::path::{Path, PathBuf};

use gramcheck_error::{Error, Result};

/// Where a grammar module lives.
///
/// The harness never searches for modules itself: a `Library` path is handed
/// to the platform loader as-is, and a `Linked` module is looked up among the
/// entry points compiled into the host process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleRef {
    /// A shared library on disk (`.so`, `.dylib`, `.dll`).
    Library(PathBuf),
    /// An entry point linked into the running binary.
    Linked,
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleRef::Library(path) => write!(f, "library:{}", path.display()),
            ModuleRef::Linked => write!(f, "linked"),
        }
    }
}

/// Descriptor of one grammar under test. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarDescriptor {
    name: String,
    module: ModuleRef,
    entry_point: String,
    min_abi_version: Option<usize>,
}

impl GrammarDescriptor {
    /// Create a descriptor whose entry point follows the `tree_sitter_<name>`
    /// convention.
    pub fn new(name: impl Into<String>, module: ModuleRef) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_descriptor("grammar name must not be empty")
                .with_operation("descriptor::new"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(
                Error::invalid_descriptor(format!("grammar name '{name}' contains whitespace"))
                    .with_operation("descriptor::new")
                    .with_context("grammar", name),
            );
        }

        let entry_point = default_entry_point(&name);
        Ok(Self {
            name,
            module,
            entry_point,
            min_abi_version: None,
        })
    }

    pub fn library(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Self::new(name, ModuleRef::Library(path.as_ref().to_path_buf()))
    }

    pub fn linked(name: impl Into<String>) -> Result<Self> {
        Self::new(name, ModuleRef::Linked)
    }

    /// Override the exported symbol the loader invokes.
    pub fn with_entry_point(mut self, symbol: impl Into<String>) -> Result<Self> {
        let symbol = symbol.into();
        if !is_c_identifier(&symbol) {
            return Err(Error::invalid_descriptor(format!(
                "entry point '{symbol}' is not a valid C identifier"
            ))
            .with_operation("descriptor::with_entry_point")
            .with_context("grammar", self.name.clone()));
        }
        self.entry_point = symbol;
        Ok(self)
    }

    /// Require the loaded grammar to report at least this ABI version.
    pub fn with_min_abi_version(mut self, version: usize) -> Self {
        self.min_abi_version = Some(version);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn min_abi_version(&self) -> Option<usize> {
        self.min_abi_version
    }
}

/// `tree_sitter_<name>`, with every character that cannot appear in a C
/// identifier replaced by `_`.
pub fn default_entry_point(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("tree_sitter_{sanitized}")
}

fn is_c_identifier(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramcheck_error::ErrorKind;

    #[test]
    fn test_default_entry_point() {
        assert_eq!(default_entry_point("barq"), "tree_sitter_barq");
        assert_eq!(default_entry_point("c-sharp"), "tree_sitter_c_sharp");
        assert_eq!(default_entry_point("Cerium"), "tree_sitter_cerium");
    }

    #[test]
    fn test_descriptor_defaults() {
        let desc = GrammarDescriptor::library("barq", "build/libtree-sitter-barq.so").unwrap();
        assert_eq!(desc.name(), "barq");
        assert_eq!(desc.entry_point(), "tree_sitter_barq");
        assert_eq!(desc.min_abi_version(), None);
        assert_eq!(
            desc.module(),
            &ModuleRef::Library(PathBuf::from("build/libtree-sitter-barq.so"))
        );
    }

    #[test]
    fn test_descriptor_overrides() {
        let desc = GrammarDescriptor::linked("cerium")
            .unwrap()
            .with_entry_point("tree_sitter_cerium_v2")
            .unwrap()
            .with_min_abi_version(14);
        assert_eq!(desc.entry_point(), "tree_sitter_cerium_v2");
        assert_eq!(desc.min_abi_version(), Some(14));
        assert_eq!(desc.module().to_string(), "linked");
    }

    #[test]
    fn test_rejects_bad_names() {
        let err = GrammarDescriptor::linked("  ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);

        let err = GrammarDescriptor::linked("two words").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);
    }

    #[test]
    fn test_rejects_bad_entry_point() {
        let err = GrammarDescriptor::linked("barq")
            .unwrap()
            .with_entry_point("9lives")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);
        assert_eq!(err.context_value("grammar"), Some("barq"));

        assert!(
            GrammarDescriptor::linked("barq")
                .unwrap()
                .with_entry_point("tree-sitter-barq")
                .is_err()
        );
    }
}
