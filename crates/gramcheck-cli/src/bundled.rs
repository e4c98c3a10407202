//! Grammars linked into the gramcheck binary.

use gramcheck_core::{GrammarDescriptor, LanguageFn, NativeHost, Result};

pub struct BundledGrammar {
    pub name: &'static str,
    pub language: LanguageFn,
}

pub fn bundled_grammars() -> Vec<BundledGrammar> {
    vec![
        BundledGrammar {
            name: "rust",
            language: tree_sitter_rust::LANGUAGE,
        },
        BundledGrammar {
            name: "cpp",
            language: tree_sitter_cpp::LANGUAGE,
        },
        BundledGrammar {
            name: "python",
            language: tree_sitter_python::LANGUAGE,
        },
        BundledGrammar {
            name: "typescript",
            language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        },
        BundledGrammar {
            name: "tsx",
            language: tree_sitter_typescript::LANGUAGE_TSX,
        },
    ]
}

/// A host that can resolve every bundled grammar as a linked module.
pub fn native_host() -> NativeHost {
    let mut host = NativeHost::new();
    for grammar in bundled_grammars() {
        host.link(gramcheck_core::default_entry_point(grammar.name), grammar.language);
    }
    host
}

/// One linked descriptor per bundled grammar.
pub fn bundled_descriptors() -> Result<Vec<GrammarDescriptor>> {
    bundled_grammars()
        .into_iter()
        .map(|grammar| GrammarDescriptor::linked(grammar.name))
        .collect()
}
