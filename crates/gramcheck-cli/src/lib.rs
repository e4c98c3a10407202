//! gramcheck command-line interface.

pub mod bundled;
pub mod options;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gramcheck_core::{
    DEFAULT_MANIFEST, HarnessRegistry, Loader, Manifest, Report, Result, manifest_dir,
};
use tracing::info;

pub use options::{HarnessOptions, OutputFormat, OutputOptions};

/// Read the manifest named on the command line, or `./gramcheck.toml` when
/// it exists. Returns the manifest and the directory relative library paths
/// resolve against.
pub fn load_manifest(opts: &HarnessOptions) -> Result<(Manifest, PathBuf)> {
    let path = match &opts.manifest {
        Some(path) => path.clone(),
        None => {
            let default = PathBuf::from(DEFAULT_MANIFEST);
            if !default.is_file() {
                return Ok((Manifest::default(), PathBuf::from(".")));
            }
            default
        }
    };

    let manifest =
        Manifest::from_path(&path).map_err(|err| err.with_operation("cli::load_manifest"))?;
    let base_dir = manifest_dir(&path);
    info!(path = %path.display(), grammars = manifest.grammars.len(), "manifest loaded");
    Ok((manifest, base_dir))
}

/// Assemble the registry: bundled grammars first (unless disabled), then the
/// manifest's grammars in file order.
pub fn build_registry(opts: &HarnessOptions) -> Result<HarnessRegistry> {
    let (manifest, base_dir) = load_manifest(opts)?;

    let timeout = opts
        .timeout_ms
        .map(Duration::from_millis)
        .or_else(|| manifest.load_timeout());
    let loader = Loader::new(Arc::new(bundled::native_host())).with_timeout(timeout);
    let mut registry = HarnessRegistry::new(loader);

    if manifest.harness.bundled && !opts.no_bundled {
        registry.register_all(bundled::bundled_descriptors()?)?;
    }
    registry.register_all(manifest.descriptors(&base_dir)?)?;

    Ok(registry)
}

/// Main entry point: build the registry and check the selected grammars.
pub fn run_main(opts: &HarnessOptions, filters: &[String]) -> Result<Report> {
    let registry = build_registry(opts)?;
    registry.run_selected(filters)
}
