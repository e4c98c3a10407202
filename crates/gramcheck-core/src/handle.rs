//! Opaque language handles produced by a successful load.

use libloading::Library;
use serde::Serialize;
use tree_sitter::Language;

/// Read-only view of a loaded grammar's language table.
///
/// Only the ABI version is mandatory. Counts a module cannot report stay
/// `None` and the checks that depend on them are skipped.
pub trait LanguageTable: Send {
    fn abi_version(&self) -> usize;

    /// Number of grammar symbols (node kinds).
    fn symbol_count(&self) -> Option<usize> {
        None
    }

    fn field_count(&self) -> Option<usize> {
        None
    }

    fn state_count(&self) -> Option<usize> {
        None
    }

    /// Name embedded by the grammar generator (ABI 15 and later).
    fn grammar_name(&self) -> Option<&str> {
        None
    }
}

/// Facts read from a language table, kept in the verdict after the handle
/// itself is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarFacts {
    pub abi_version: usize,
    pub symbol_count: Option<usize>,
    pub field_count: Option<usize>,
    pub state_count: Option<usize>,
    pub grammar_name: Option<String>,
}

/// Opaque value returned by a successful load.
///
/// Owned by exactly one validation pass and dropped right after it. A handle
/// backed by a shared library keeps that library mapped until it is dropped.
pub struct LanguageHandle {
    table: Option<Box<dyn LanguageTable>>,
}

impl LanguageHandle {
    pub fn new(table: Box<dyn LanguageTable>) -> Self {
        Self { table: Some(table) }
    }

    /// The empty sentinel.
    pub fn null() -> Self {
        Self { table: None }
    }

    pub fn is_null(&self) -> bool {
        self.table.is_none()
    }

    pub fn table(&self) -> Option<&dyn LanguageTable> {
        self.table.as_deref()
    }

    pub fn facts(&self) -> Option<GrammarFacts> {
        let table = self.table()?;
        Some(GrammarFacts {
            abi_version: table.abi_version(),
            symbol_count: table.symbol_count(),
            field_count: table.field_count(),
            state_count: table.state_count(),
            grammar_name: table.grammar_name().map(str::to_string),
        })
    }
}

impl std::fmt::Debug for LanguageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.table() {
            Some(table) => f
                .debug_struct("LanguageHandle")
                .field("abi_version", &table.abi_version())
                .field("symbol_count", &table.symbol_count())
                .finish(),
            None => f.write_str("LanguageHandle(null)"),
        }
    }
}

/// A tree-sitter `TSLanguage` obtained from a real grammar module.
pub struct TreeSitterTable {
    // Declared before `library` so the language is released before the
    // library that holds its tables is unmapped.
    language: Language,
    library: Option<Library>,
}

impl TreeSitterTable {
    pub(crate) fn new(language: Language, library: Option<Library>) -> Self {
        Self { language, library }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }
}

impl LanguageTable for TreeSitterTable {
    fn abi_version(&self) -> usize {
        self.language.abi_version()
    }

    fn symbol_count(&self) -> Option<usize> {
        Some(self.language.node_kind_count())
    }

    fn field_count(&self) -> Option<usize> {
        Some(self.language.field_count())
    }

    fn state_count(&self) -> Option<usize> {
        Some(self.language.parse_state_count())
    }

    fn grammar_name(&self) -> Option<&str> {
        self.language.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table {
        symbols: Option<usize>,
    }

    impl LanguageTable for Table {
        fn abi_version(&self) -> usize {
            14
        }

        fn symbol_count(&self) -> Option<usize> {
            self.symbols
        }
    }

    #[test]
    fn test_null_handle() {
        let handle = LanguageHandle::null();
        assert!(handle.is_null());
        assert!(handle.facts().is_none());
        assert_eq!(format!("{handle:?}"), "LanguageHandle(null)");
    }

    #[test]
    fn test_facts_from_table() {
        let handle = LanguageHandle::new(Box::new(Table { symbols: Some(42) }));
        assert!(!handle.is_null());

        let facts = handle.facts().unwrap();
        assert_eq!(facts.abi_version, 14);
        assert_eq!(facts.symbol_count, Some(42));
        assert_eq!(facts.field_count, None);
        assert_eq!(facts.grammar_name, None);
    }
}
