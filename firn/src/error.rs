use {std::io, thiserror::Error};

/// Error returned by [`Compiler::compile`][`crate::Compiler::compile`]
/// when a run could not complete normally.
///
/// Problems with the program being compiled are not errors here;
/// they are reported as diagnostics and reflected in the [`Outcome`].
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CompileError
{
    #[error("Attempt to reuse a compiler")]
    Reused,

    #[error("The system is out of resources: {0}")]
    ResourceExhausted(String),

    #[error("Annotation processing failed: {0}")]
    Processing(#[source] anyhow::Error),

    #[error("Internal compiler error: {0}")]
    Internal(#[source] anyhow::Error),

    #[error("Cannot close resource: {0}")]
    Close(#[from] io::Error),
}

/// Summary of a compile run that completed.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome
{
    /// No errors were reported.
    Success{warnings: usize},

    /// Errors were reported.
    Failed{errors: usize, warnings: usize},
}

impl Outcome
{
    /// The outcome given the final error and warning counts.
    pub fn from_counts(errors: usize, warnings: usize) -> Self
    {
        if errors == 0 {
            Self::Success{warnings}
        } else {
            Self::Failed{errors, warnings}
        }
    }

    /// Whether no errors were reported.
    pub fn is_success(self) -> bool
    {
        matches!(self, Self::Success{..})
    }
}
