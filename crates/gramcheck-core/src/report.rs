//! Verdicts and the report a harness run produces.

use std::fmt;

use gramcheck_error::{Error, ErrorKind, Result};
use serde::{Serialize, Serializer};

use crate::handle::GrammarFacts;
use crate::loader::LoadErrorKind;
use crate::validator::Check;

/// Exit code when every verdict passed.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code when at least one verdict failed.
pub const EXIT_FAILURE: u8 = 1;

/// Why a grammar failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailReason {
    Load(LoadErrorKind),
    Check(Check),
    /// A panic inside the module or the harness, caught and contained.
    InternalFault,
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::Load(kind) => write!(f, "{kind}"),
            FailReason::Check(check) => write!(f, "{check}"),
            FailReason::InternalFault => f.write_str("InternalFault"),
        }
    }
}

impl Serialize for FailReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail(FailReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    pub check: Check,
    pub passed: bool,
}

/// Outcome for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub descriptor_name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub checks_run: Vec<CheckRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<GrammarFacts>,
}

impl Verdict {
    /// Verdict for a module that never produced a handle.
    pub fn load_failure(name: impl Into<String>, kind: LoadErrorKind, detail: String) -> Self {
        let (outcome, checks_run) = match kind {
            // A null table is exactly what the first check guards against.
            LoadErrorKind::EntryPointReturnedNull => (
                Outcome::Fail(FailReason::Check(Check::HandleNonNull)),
                vec![CheckRecord {
                    check: Check::HandleNonNull,
                    passed: false,
                }],
            ),
            kind => (Outcome::Fail(FailReason::Load(kind)), Vec::new()),
        };
        Self {
            descriptor_name: name.into(),
            outcome,
            checks_run,
            detail: Some(detail),
            facts: None,
        }
    }

    pub fn internal_fault(name: impl Into<String>, detail: String) -> Self {
        Self {
            descriptor_name: name.into(),
            outcome: Outcome::Fail(FailReason::InternalFault),
            checks_run: Vec::new(),
            detail: Some(detail),
            facts: None,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    pub fn reason(&self) -> Option<&FailReason> {
        match &self.outcome {
            Outcome::Pass => None,
            Outcome::Fail(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Verdict {
    /// `<name>: PASS` or `<name>: FAIL (<reason>)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Pass => write!(f, "{}: PASS", self.descriptor_name),
            Outcome::Fail(reason) => write!(f, "{}: FAIL ({reason})", self.descriptor_name),
        }
    }
}

/// Verdicts in descriptor registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    verdicts: Vec<Verdict>,
}

impl Report {
    pub(crate) fn push(&mut self, verdict: Verdict) {
        self.verdicts.push(verdict);
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn get(&self, name: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.descriptor_name == name)
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// One line per verdict.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for verdict in &self.verdicts {
            out.push_str(&verdict.to_string());
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| {
            Error::new(ErrorKind::SerializationFailed, err.to_string())
                .with_operation("report::to_json")
                .set_source(err)
        })
    }
}
