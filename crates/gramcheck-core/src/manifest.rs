//! TOML manifest listing the grammars a harness run should check.
//!
//! ```toml
//! [harness]
//! load_timeout_ms = 5000
//! bundled = true
//!
//! [[grammar]]
//! name = "barq"
//! library = "build/libtree-sitter-barq.so"
//! min_abi_version = 14
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gramcheck_error::{Error, ErrorKind, Result};
use serde::Deserialize;

use crate::descriptor::GrammarDescriptor;

/// File name looked up in the working directory when no manifest is given.
pub const DEFAULT_MANIFEST: &str = "gramcheck.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub harness: HarnessSection,
    #[serde(default, rename = "grammar")]
    pub grammars: Vec<GrammarEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessSection {
    #[serde(default)]
    pub load_timeout_ms: Option<u64>,
    /// Also check the grammars linked into the binary.
    #[serde(default = "HarnessSection::default_bundled")]
    pub bundled: bool,
}

impl HarnessSection {
    fn default_bundled() -> bool {
        true
    }
}

impl Default for HarnessSection {
    fn default() -> Self {
        Self {
            load_timeout_ms: None,
            bundled: Self::default_bundled(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarEntry {
    pub name: String,
    /// Shared library path, relative paths resolved against the manifest.
    #[serde(default)]
    pub library: Option<PathBuf>,
    #[serde(default)]
    pub linked: bool,
    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default)]
    pub min_abi_version: Option<usize>,
}

impl GrammarEntry {
    fn to_descriptor(&self, base_dir: &Path) -> Result<GrammarDescriptor> {
        let descriptor = match (&self.library, self.linked) {
            (Some(path), false) => {
                let path = if path.is_relative() {
                    resolve_base(base_dir).join(path)
                } else {
                    path.clone()
                };
                GrammarDescriptor::library(&self.name, path)?
            }
            (None, true) => GrammarDescriptor::linked(&self.name)?,
            (Some(_), true) => {
                return Err(Error::config_invalid(format!(
                    "grammar '{}' sets both `library` and `linked`",
                    self.name
                )));
            }
            (None, false) => {
                return Err(Error::config_invalid(format!(
                    "grammar '{}' needs either `library` or `linked = true`",
                    self.name
                )));
            }
        };

        let descriptor = match &self.entry_point {
            Some(symbol) => descriptor.with_entry_point(symbol)?,
            None => descriptor,
        };
        Ok(match self.min_abi_version {
            Some(version) => descriptor.with_min_abi_version(version),
            None => descriptor,
        })
    }
}

/// Directory that relative library paths in the manifest at `path` resolve
/// against. A bare file name lives in the working directory.
pub fn manifest_dir(path: &Path) -> PathBuf {
    resolve_base(path.parent().unwrap_or(Path::new(""))).to_path_buf()
}

fn resolve_base(base_dir: &Path) -> &Path {
    if base_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        base_dir
    }
}

impl Manifest {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::from(err)
                .with_operation("manifest::from_path")
                .with_context("path", path.display().to_string())
        })?;
        Self::parse(&text).map_err(|err| err.with_context("path", path.display().to_string()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| {
            Error::new(ErrorKind::DeserializationFailed, err.to_string())
                .with_operation("manifest::parse")
                .set_source(err)
        })
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.harness.load_timeout_ms.map(Duration::from_millis)
    }

    /// Descriptors in manifest order. Relative library paths are joined
    /// onto `base_dir`, normally the manifest's directory.
    pub fn descriptors(&self, base_dir: &Path) -> Result<Vec<GrammarDescriptor>> {
        self.grammars
            .iter()
            .map(|entry| {
                entry
                    .to_descriptor(base_dir)
                    .map_err(|err| err.with_operation("manifest::descriptors"))
            })
            .collect()
    }
}
