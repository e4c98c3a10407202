//! Error kinds for harness assembly and configuration.

use strum_macros::{Display, IntoStaticStr};

/// What went wrong while assembling or configuring a harness run.
///
/// Failures of a grammar module under test are never an `ErrorKind`; those
/// end up as verdicts in the report. These kinds describe a malformed test
/// suite or an unusable environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // Registry errors
    // =========================================================================
    /// Two descriptors share a name
    DuplicateDescriptor,

    /// A filter named a grammar that is not registered
    UnknownGrammar,

    /// Descriptor fields are inconsistent (empty name, bad entry point, ...)
    InvalidDescriptor,

    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Manifest content is invalid
    ConfigInvalid,

    /// Manifest could not be deserialized
    DeserializationFailed,

    /// Report could not be serialized
    SerializationFailed,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}
