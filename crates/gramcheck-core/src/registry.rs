//! Registry of grammar descriptors and the driver that checks them.
//!
//! Runs are strictly sequential: loading a grammar touches process-global
//! linker state, and sequential runs keep report order reproducible.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use gramcheck_error::{Error, Result};

use crate::descriptor::GrammarDescriptor;
use crate::loader::{LoadResult, Loader};
use crate::report::{Report, Verdict};
use crate::validator::validate;

/// Descriptors under test, in registration order, plus the loader that
/// resolves them.
pub struct HarnessRegistry {
    loader: Loader,
    descriptors: Vec<GrammarDescriptor>,
    names: HashSet<String>,
}

impl HarnessRegistry {
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            descriptors: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Add a descriptor. A name that is already registered is rejected
    /// immediately.
    pub fn register(&mut self, descriptor: GrammarDescriptor) -> Result<()> {
        if !self.names.insert(descriptor.name().to_string()) {
            return Err(Error::duplicate_descriptor(descriptor.name())
                .with_operation("registry::register")
                .with_context("module", descriptor.module().to_string()));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = GrammarDescriptor>,
    ) -> Result<()> {
        descriptors
            .into_iter()
            .try_for_each(|descriptor| self.register(descriptor))
    }

    pub fn get(&self, name: &str) -> Option<&GrammarDescriptor> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    pub fn descriptors(&self) -> &[GrammarDescriptor] {
        &self.descriptors
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check every registered descriptor.
    pub fn run_all(&self) -> Report {
        self.run(self.descriptors.iter())
    }

    /// Check only the named descriptors, still in registration order. An
    /// empty selection runs everything; an unknown name is an error.
    pub fn run_selected<I, S>(&self, names: I) -> Result<Report>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected = self
            .select(names)
            .map_err(|err| err.with_operation("registry::run_selected"))?;
        Ok(self.run(selected.into_iter()))
    }

    /// Resolve name filters to descriptors in registration order without
    /// loading anything. Same selection rules as [`Self::run_selected`].
    pub fn select<I, S>(&self, names: I) -> Result<Vec<&GrammarDescriptor>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        if let Some(unknown) = names.iter().find(|name| !self.names.contains(name.as_ref())) {
            return Err(
                Error::unknown_grammar(unknown.as_ref()).with_operation("registry::select")
            );
        }

        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        Ok(self
            .descriptors
            .iter()
            .filter(|d| wanted.is_empty() || wanted.contains(d.name()))
            .collect())
    }

    fn run<'a>(&self, descriptors: impl Iterator<Item = &'a GrammarDescriptor>) -> Report {
        let mut report = Report::default();
        for descriptor in descriptors {
            report.push(self.check(descriptor));
        }
        tracing::info!(
            total = report.len(),
            passed = report.passed(),
            failed = report.failed(),
            "harness run complete"
        );
        report
    }

    /// Load and validate one descriptor. Never panics and never fails: every
    /// outcome, including a panic inside the module, becomes a verdict.
    fn check(&self, descriptor: &GrammarDescriptor) -> Verdict {
        tracing::debug!(
            grammar = descriptor.name(),
            module = %descriptor.module(),
            entry_point = descriptor.entry_point(),
            "loading grammar"
        );

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            match self.loader.load(descriptor) {
                LoadResult::Loaded(handle) => validate(handle, descriptor),
                LoadResult::Failed(kind, detail) => {
                    tracing::debug!(grammar = descriptor.name(), %kind, %detail, "load failed");
                    Verdict::load_failure(descriptor.name(), kind, detail)
                }
            }
        }));

        let verdict = attempt.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::warn!(grammar = descriptor.name(), %message, "grammar check panicked");
            Verdict::internal_fault(descriptor.name(), message)
        });

        if let Some(reason) = verdict.reason() {
            tracing::warn!(grammar = descriptor.name(), %reason, "grammar failed");
        }
        verdict
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use gramcheck_error::ErrorKind;
    use pretty_assertions::assert_eq;

    use crate::loader::LoadErrorKind;
    use crate::report::{FailReason, Outcome};
    use crate::testing::{FakeHost, FakeModule};
    use crate::validator::Check;

    fn registry(host: FakeHost) -> HarnessRegistry {
        HarnessRegistry::new(Loader::new(Arc::new(host)).with_supported_abi(13..=15))
    }

    fn lib(name: &str) -> GrammarDescriptor {
        GrammarDescriptor::library(name, format!("lib{name}.so")).unwrap()
    }

    fn lines(report: &Report) -> Vec<String> {
        report.verdicts().iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_barq_and_cerium_pass_in_order() {
        let host = FakeHost::new()
            .with("barq", FakeModule::table(14, 88))
            .with("cerium", FakeModule::table(14, 64));
        let mut registry = registry(host);
        registry.register(lib("barq")).unwrap();
        registry.register(lib("cerium")).unwrap();

        let report = registry.run_all();
        assert_eq!(lines(&report), vec!["barq: PASS", "cerium: PASS"]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_duplicate_descriptor_rejected_at_registration() {
        let mut registry = registry(FakeHost::new());
        registry.register(lib("barq")).unwrap();

        let err = registry
            .register(GrammarDescriptor::linked("barq").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateDescriptor);
        assert_eq!(err.context_value("grammar"), Some("barq"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_module_skips_validation() {
        let host = FakeHost::new();
        let mut registry = registry(host);
        registry
            .register(GrammarDescriptor::library("broken", "/does/not/exist.so").unwrap())
            .unwrap();

        let report = registry.run_all();
        let verdict = &report.verdicts()[0];
        assert_eq!(
            verdict.outcome,
            Outcome::Fail(FailReason::Load(LoadErrorKind::ModuleNotFound))
        );
        assert!(verdict.checks_run.is_empty());
        assert!(verdict.facts.is_none());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_null_handle_reports_handle_check() {
        let host = FakeHost::new().with("cerium", FakeModule::Null);
        let mut registry = registry(host);
        registry.register(lib("cerium")).unwrap();

        let report = registry.run_all();
        assert_eq!(lines(&report), vec!["cerium: FAIL (handle_non_null)"]);
        assert_eq!(
            report.verdicts()[0].reason(),
            Some(&FailReason::Check(Check::HandleNonNull))
        );
    }

    #[test]
    fn test_one_bad_grammar_does_not_stop_the_run() {
        let host = FakeHost::new()
            .with("barq", FakeModule::table(14, 88))
            .with("crashy", FakeModule::Panic)
            .with("hollow", FakeModule::table(14, 0))
            .with("cerium", FakeModule::table(15, 64));
        let mut registry = registry(host);
        registry
            .register_all(["barq", "crashy", "missing", "hollow", "cerium"].map(lib))
            .unwrap();

        let report = registry.run_all();
        assert_eq!(
            lines(&report),
            vec![
                "barq: PASS",
                "crashy: FAIL (InternalFault)",
                "missing: FAIL (ModuleNotFound)",
                "hollow: FAIL (symbol_table_nonempty)",
                "cerium: PASS",
            ]
        );
        assert!(
            report.verdicts()[1]
                .detail
                .as_deref()
                .unwrap()
                .contains("blew up")
        );
    }

    #[test]
    fn test_min_abi_floor_enforced_by_validator() {
        let host = FakeHost::new().with("barq", FakeModule::table(14, 10));
        let mut registry = registry(host);
        registry
            .register(lib("barq").with_min_abi_version(15))
            .unwrap();

        let report = registry.run_all();
        assert_eq!(lines(&report), vec!["barq: FAIL (abi_version_supported)"]);
    }

    #[test]
    fn test_timeout_becomes_verdict() {
        let host = FakeHost::new()
            .with("slow", FakeModule::Hang(Duration::from_secs(2)))
            .with("crashy", FakeModule::Panic)
            .with("barq", FakeModule::table(14, 10));
        let loader = Loader::new(Arc::new(host))
            .with_supported_abi(13..=15)
            .with_timeout(Some(Duration::from_millis(200)));
        let mut registry = HarnessRegistry::new(loader);
        registry
            .register_all(["slow", "crashy", "barq"].map(lib))
            .unwrap();

        let report = registry.run_all();
        assert_eq!(
            lines(&report),
            vec![
                "slow: FAIL (LoadTimeout)",
                "crashy: FAIL (InternalFault)",
                "barq: PASS",
            ]
        );
        // The helper thread's panic message survives the re-raise.
        assert!(
            report.verdicts()[1]
                .detail
                .as_deref()
                .unwrap()
                .contains("blew up")
        );
    }

    #[test]
    fn test_runs_are_idempotent() {
        let host = FakeHost::new()
            .with("barq", FakeModule::table(14, 88))
            .with("cerium", FakeModule::Null);
        let mut registry = registry(host);
        registry
            .register_all(["barq", "cerium", "broken"].map(lib))
            .unwrap();

        let first = registry.run_all();
        let second = registry.run_all();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_run_selected() {
        let host = FakeHost::new()
            .with("barq", FakeModule::table(14, 88))
            .with("cerium", FakeModule::table(14, 64));
        let mut registry = registry(host);
        registry.register_all(["barq", "cerium"].map(lib)).unwrap();

        // Registration order wins over filter order.
        let report = registry.run_selected(["cerium", "barq"]).unwrap();
        assert_eq!(lines(&report), vec!["barq: PASS", "cerium: PASS"]);

        let report = registry.run_selected(["cerium"]).unwrap();
        assert_eq!(lines(&report), vec!["cerium: PASS"]);

        assert_eq!(registry.run_selected(Vec::<String>::new()).unwrap().len(), 2);

        let err = registry.run_selected(["barq", "zig"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownGrammar);
        assert_eq!(err.operation(), "registry::run_selected");
    }

    #[test]
    fn test_select_without_loading() {
        let host = Arc::new(FakeHost::new().with("barq", FakeModule::table(14, 88)));
        let loader = Loader::new(host.clone()).with_supported_abi(13..=15);
        let mut registry = HarnessRegistry::new(loader);
        registry
            .register_all(["barq", "cerium", "broken"].map(lib))
            .unwrap();

        let names = |selected: Vec<&GrammarDescriptor>| -> Vec<String> {
            selected.iter().map(|d| d.name().to_string()).collect()
        };
        assert_eq!(
            names(registry.select(["broken", "barq"]).unwrap()),
            vec!["barq", "broken"]
        );
        assert_eq!(registry.select(Vec::<String>::new()).unwrap().len(), 3);

        let err = registry.select(["zig"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownGrammar);
        assert_eq!(err.context_value("grammar"), Some("zig"));
        assert_eq!(host.open_count(), 0);
    }

    #[test]
    fn test_each_run_loads_afresh() {
        let host = Arc::new(FakeHost::new().with("barq", FakeModule::table(14, 88)));
        let loader = Loader::new(host.clone()).with_supported_abi(13..=15);
        let mut registry = HarnessRegistry::new(loader);
        registry.register(lib("barq")).unwrap();

        registry.run_all();
        registry.run_all();
        assert_eq!(host.open_count(), 2);
    }
}
