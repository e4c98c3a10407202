//! Conformance checks over a loaded language handle.

use serde::Serialize;
use strum_macros::{Display, IntoStaticStr};

use crate::descriptor::GrammarDescriptor;
use crate::handle::LanguageHandle;
use crate::report::{CheckRecord, FailReason, Outcome, Verdict};

/// One structural property of a loaded grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// The handle is not the null sentinel.
    HandleNonNull,
    /// The reported ABI version meets the descriptor's floor, if any.
    AbiVersionSupported,
    /// An introspectable symbol table is not empty.
    SymbolTableNonempty,
}

impl Check {
    /// The battery, in the order it runs.
    pub const BATTERY: [Check; 3] = [
        Check::HandleNonNull,
        Check::AbiVersionSupported,
        Check::SymbolTableNonempty,
    ];

    pub fn name(&self) -> &'static str {
        (*self).into()
    }

    fn evaluate(&self, handle: &LanguageHandle, descriptor: &GrammarDescriptor) -> bool {
        let Some(table) = handle.table() else {
            return false;
        };
        match self {
            Check::HandleNonNull => true,
            Check::AbiVersionSupported => descriptor
                .min_abi_version()
                .is_none_or(|floor| table.abi_version() >= floor),
            Check::SymbolTableNonempty => table.symbol_count().is_none_or(|count| count > 0),
        }
    }
}

/// Run the battery over `handle`, which is consumed and dropped on return.
///
/// Checks run in [`Check::BATTERY`] order and stop at the first failure, so
/// `checks_run` ends with the failing check and the reason always names it.
pub fn validate(handle: LanguageHandle, descriptor: &GrammarDescriptor) -> Verdict {
    let facts = handle.facts();
    let mut checks_run = Vec::with_capacity(Check::BATTERY.len());
    let mut outcome = Outcome::Pass;

    for check in Check::BATTERY {
        let passed = check.evaluate(&handle, descriptor);
        checks_run.push(CheckRecord { check, passed });
        if !passed {
            outcome = Outcome::Fail(FailReason::Check(check));
            break;
        }
    }

    let detail = match (&outcome, &facts) {
        (Outcome::Fail(FailReason::Check(Check::AbiVersionSupported)), Some(facts)) => {
            Some(format!(
                "ABI version {} is below the required minimum {}",
                facts.abi_version,
                descriptor.min_abi_version().unwrap_or_default()
            ))
        }
        (Outcome::Fail(FailReason::Check(Check::SymbolTableNonempty)), _) => {
            Some("language table declares no symbols".to_string())
        }
        (Outcome::Fail(FailReason::Check(Check::HandleNonNull)), _) => {
            Some("language handle is null".to_string())
        }
        _ => None,
    };

    Verdict {
        descriptor_name: descriptor.name().to_string(),
        outcome,
        checks_run,
        detail,
        facts,
    }
}
