//! Command-line option groups shared by the gramcheck binary and its tests.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `<name>: PASS|FAIL (<reason>)` line per grammar
    #[default]
    Text,
    /// Full report as JSON, including checks and grammar facts
    Json,
}

/// Where grammars come from and how they are loaded.
#[derive(Args, Debug, Clone, Default)]
pub struct HarnessOptions {
    /// Manifest listing grammar modules (defaults to ./gramcheck.toml if present)
    #[arg(short = 'm', long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Do not check the grammars linked into this binary
    #[arg(long = "no-bundled")]
    pub no_bundled: bool,

    /// Wall-clock budget per grammar load, in milliseconds (overrides the manifest)
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

/// How the report is printed.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputOptions {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print failure details under each failing grammar
    #[arg(short, long)]
    pub verbose: bool,
}

impl HarnessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    pub fn with_no_bundled(mut self, no_bundled: bool) -> Self {
        self.no_bundled = no_bundled;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
