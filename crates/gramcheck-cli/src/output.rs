//! Report rendering.

use std::fmt::Write;

use gramcheck_core::{GrammarDescriptor, Report, Result};

use crate::options::{OutputFormat, OutputOptions};

pub fn render_report(report: &Report, opts: &OutputOptions) -> Result<String> {
    match opts.format {
        OutputFormat::Json => report.to_json(),
        OutputFormat::Text if !opts.verbose => Ok(report.render_text()),
        OutputFormat::Text => {
            let mut out = String::new();
            for verdict in report.verdicts() {
                let _ = writeln!(out, "{verdict}");
                if verdict.is_pass() {
                    continue;
                }
                if let Some(detail) = &verdict.detail {
                    let _ = writeln!(out, "    {detail}");
                }
                for record in verdict.checks_run.iter().filter(|r| !r.passed) {
                    let _ = writeln!(out, "    check {} failed", record.check);
                }
            }
            Ok(out)
        }
    }
}

pub fn render_summary(report: &Report) -> String {
    format!("{} passed, {} failed", report.passed(), report.failed())
}

/// `--list` output: one row per registered descriptor, nothing loaded.
pub fn render_descriptors(descriptors: &[&GrammarDescriptor]) -> String {
    let width = descriptors
        .iter()
        .map(|d| d.name().len())
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    for descriptor in descriptors {
        let _ = write!(
            out,
            "{:<width$}  {}  {}",
            descriptor.name(),
            descriptor.entry_point(),
            descriptor.module()
        );
        if let Some(floor) = descriptor.min_abi_version() {
            let _ = write!(out, "  abi>={floor}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_descriptors() {
        let rust = GrammarDescriptor::linked("rust").unwrap();
        let barq = GrammarDescriptor::library("barq", "/opt/libtree-sitter-barq.so")
            .unwrap()
            .with_min_abi_version(14);
        assert_eq!(
            render_descriptors(&[&rust, &barq]),
            "rust  tree_sitter_rust  linked\n\
             barq  tree_sitter_barq  library:/opt/libtree-sitter-barq.so  abi>=14\n"
        );
    }
}
