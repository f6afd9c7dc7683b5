//! Errors returned at phase boundaries.

use {crate::tree::Name, thiserror::Error};

/// Result of a phase.
pub type Result<T> = std::result::Result<T, PhaseError>;

/// Reason a phase ended early.
///
/// Ordinary problems with the program being compiled are not errors here;
/// they are reported to the log and the phase returns normally.
#[derive(Debug, Error)]
pub enum PhaseError
{
    /// The problem was already reported; unwind without reporting more.
    #[error("Compilation aborted")]
    Abort,

    /// A class needed on demand could not be completed.
    ///
    /// The driver reports this where it is caught and carries on.
    #[error("Cannot access class `{class}`: {reason}")]
    CompletionFailure
    {
        /// Flat name of the class.
        class: Name,

        /// Why the class could not be completed.
        reason: String,
    },

    /// The compiler ran out of memory, stack or another resource.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// An annotation processor failed.
    #[error("Annotation processing failed: {0}")]
    Processing(#[source] anyhow::Error),

    /// A bug in the compiler.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PhaseError
{
    /// Create a completion failure.
    pub fn completion_failure(class: impl Into<Name>, reason: impl Into<String>)
        -> Self
    {
        Self::CompletionFailure{class: class.into(), reason: reason.into()}
    }
}
