//! # Error types for batch compilation
//!
//! A batch is all-or-nothing: the first error aborts the whole parse and
//! no partial entity set is ever returned to the caller.

use std::fmt::Display;

use thiserror::Error;

/// A boxed error that is thread-safe and sendable across threads.
/// Used at the [`EntityLookup`](crate::resolver::EntityLookup) boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while compiling a batch document.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Malformed line or cell shape.
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Unknown entity id, or `LAST` with no prior context.
    #[error("ResolutionError: {0}")]
    Resolution(String),

    /// Edit kind unsupported by the resolved entity's variant.
    #[error("CapabilityError: {0}")]
    Capability(String),

    /// Edit would overwrite a differing existing value, or the statement
    /// target is ambiguous.
    #[error("ConflictError: {0}")]
    Conflict(String),
}

impl BatchError {
    pub fn syntax(err: impl Display) -> Self {
        BatchError::Syntax(format!("{err}"))
    }

    pub fn resolution(err: impl Display) -> Self {
        BatchError::Resolution(format!("{err}"))
    }

    pub fn capability(err: impl Display) -> Self {
        BatchError::Capability(format!("{err}"))
    }

    pub fn conflict(err: impl Display) -> Self {
        BatchError::Conflict(format!("{err}"))
    }
}
