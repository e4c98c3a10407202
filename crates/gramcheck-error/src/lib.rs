//! # gramcheck-error
//!
//! Errors raised while assembling a harness run: duplicate descriptors,
//! unknown filters, bad manifests, unreadable files.
//!
//! A grammar module that fails to load or validate is *not* an error here.
//! Those outcomes are recovered into verdicts by the registry so that one bad
//! grammar never aborts a run.
//!
//! ## Usage
//!
//! ```rust
//! use gramcheck_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::duplicate_descriptor("barq")
//!         .with_operation("registry::register")
//!         .with_context("manifest", "gramcheck.toml"))
//! }
//!
//! assert_eq!(example().unwrap_err().kind(), ErrorKind::DuplicateDescriptor);
//! ```
//!
//! ## Principles
//!
//! - Assembly-time functions return `Result<T, gramcheck_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using gramcheck Error
pub type Result<T> = std::result::Result<T, Error>;
