//! Reporting diagnostics.

pub use self::{deferred::*, sink::*};

use {
    crate::tree::SourceFile,
    bitflags::bitflags,
    std::{fmt, io},
};

mod deferred;
mod sink;

/// Severity of a diagnostic.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DiagnosticKind
{
    Error,
    Warning,
    Note,
}

bitflags!
{
    /// Extra properties of a diagnostic.
    pub struct DiagnosticFlags: u8
    {
        /// The diagnostic must be reported even if warnings are disabled.
        const MANDATORY     = 1 << 0;

        /// The error may go away once annotation processors
        /// have generated more source files.
        const RECOVERABLE   = 1 << 1;

        /// The error is about a name that could not be resolved.
        const RESOLVE_ERROR = 1 << 2;

        /// The error was found by the parser.
        const SYNTAX        = 1 << 3;
    }
}

/// Message about the program being compiled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic
{
    /// Severity.
    pub kind: DiagnosticKind,

    /// Extra properties.
    pub flags: DiagnosticFlags,

    /// Stable key identifying the kind of message, e.g. `cant.resolve`.
    pub code: &'static str,

    /// Human-readable message.
    pub message: String,

    /// The file the diagnostic is about.
    ///
    /// If not set when reported, the log fills in its current source.
    pub source: Option<SourceFile>,
}

impl Diagnostic
{
    /// Create a diagnostic with no flags and no source.
    pub fn new(kind: DiagnosticKind, code: &'static str,
               message: impl Into<String>) -> Self
    {
        Self{
            kind,
            flags: DiagnosticFlags::empty(),
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create an error.
    pub fn error(code: &'static str, message: impl Into<String>) -> Self
    {
        Self::new(DiagnosticKind::Error, code, message)
    }

    /// Create a warning.
    pub fn warning(code: &'static str, message: impl Into<String>) -> Self
    {
        Self::new(DiagnosticKind::Warning, code, message)
    }

    /// Create a note.
    pub fn note(code: &'static str, message: impl Into<String>) -> Self
    {
        Self::new(DiagnosticKind::Note, code, message)
    }

    /// Add flags to the diagnostic.
    pub fn with_flags(mut self, flags: DiagnosticFlags) -> Self
    {
        self.flags |= flags;
        self
    }

    /// Set the file the diagnostic is about.
    pub fn with_source(mut self, source: SourceFile) -> Self
    {
        self.source = Some(source);
        self
    }

    /// Whether the diagnostic is an error.
    pub fn is_error(&self) -> bool
    {
        self.kind == DiagnosticKind::Error
    }

    /// Whether the diagnostic is an error that annotation processing
    /// may still fix.
    pub fn is_recoverable_error(&self) -> bool
    {
        self.is_error() && self.flags.contains(DiagnosticFlags::RECOVERABLE)
    }

    /// Whether the diagnostic is an error that nothing can fix.
    pub fn is_unrecoverable_error(&self) -> bool
    {
        self.is_error() && !self.flags.contains(DiagnosticFlags::RECOVERABLE)
    }
}

impl fmt::Display for Diagnostic
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        let kind = match self.kind {
            DiagnosticKind::Error   => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note    => "note",
        };
        if let Some(source) = &self.source {
            write!(f, "{}: ", source)?;
        }
        write!(f, "{}: {}", kind, self.message)
    }
}

/* -------------------------------------------------------------------------- */
/*                                     Log                                    */
/* -------------------------------------------------------------------------- */

/// Counts diagnostics and forwards them to a sink.
///
/// While deferral is active, diagnostics are buffered instead
/// and neither counted nor forwarded until they are replayed.
pub struct Log
{
    sink: Box<dyn DiagnosticSink>,
    deferred: Option<DeferredDiagnostics>,
    current_source: Option<SourceFile>,

    errors: usize,
    warnings: usize,
    suppressed_errors: usize,
    suppressed_warnings: usize,

    max_errors: usize,
    max_warnings: usize,
}

impl Log
{
    /// Create a log that forwards at most the given numbers
    /// of errors and warnings to `sink`.
    pub fn new(
        sink: Box<dyn DiagnosticSink>,
        max_errors: usize,
        max_warnings: usize,
    ) -> Self
    {
        Self{
            sink,
            deferred: None,
            current_source: None,
            errors: 0,
            warnings: 0,
            suppressed_errors: 0,
            suppressed_warnings: 0,
            max_errors,
            max_warnings,
        }
    }

    /// Report a diagnostic.
    pub fn report(&mut self, mut diagnostic: Diagnostic)
    {
        if diagnostic.source.is_none() {
            diagnostic.source = self.current_source.clone();
        }
        match &mut self.deferred {
            Some(deferred) => deferred.push(diagnostic),
            None => self.emit(diagnostic),
        }
    }

    /// Report a diagnostic, bypassing deferral.
    pub fn report_now(&mut self, mut diagnostic: Diagnostic)
    {
        if diagnostic.source.is_none() {
            diagnostic.source = self.current_source.clone();
        }
        self.emit(diagnostic);
    }

    /// Report an error.
    pub fn error(&mut self, code: &'static str, message: impl Into<String>)
    {
        self.report(Diagnostic::error(code, message));
    }

    /// Report a warning.
    pub fn warning(&mut self, code: &'static str, message: impl Into<String>)
    {
        self.report(Diagnostic::warning(code, message));
    }

    /// Report a note.
    pub fn note(&mut self, code: &'static str, message: impl Into<String>)
    {
        self.report(Diagnostic::note(code, message));
    }

    fn emit(&mut self, diagnostic: Diagnostic)
    {
        match diagnostic.kind {
            DiagnosticKind::Error => {
                if self.errors < self.max_errors {
                    self.sink.report(&diagnostic);
                } else {
                    self.suppressed_errors += 1;
                }
                self.errors += 1;
            },
            DiagnosticKind::Warning => {
                if self.warnings < self.max_warnings {
                    self.sink.report(&diagnostic);
                } else {
                    self.suppressed_warnings += 1;
                }
                self.warnings += 1;
            },
            DiagnosticKind::Note =>
                self.sink.report(&diagnostic),
        }
    }

    /// Make `source` the file subsequent diagnostics are about.
    ///
    /// Returns the previous current source, for restoring it later.
    pub fn use_source(&mut self, source: Option<SourceFile>)
        -> Option<SourceFile>
    {
        std::mem::replace(&mut self.current_source, source)
    }

    /// The number of errors reported, including those over the limit.
    pub fn error_count(&self) -> usize
    {
        self.errors
    }

    /// The number of warnings reported, including those over the limit.
    pub fn warning_count(&self) -> usize
    {
        self.warnings
    }

    /// The numbers of errors and warnings over the limits,
    /// which were counted but not forwarded.
    pub fn suppressed_counts(&self) -> (usize, usize)
    {
        (self.suppressed_errors, self.suppressed_warnings)
    }

    /// Start buffering diagnostics.
    ///
    /// If deferral is already active, the existing buffer is kept.
    pub fn defer(&mut self)
    {
        if self.deferred.is_none() {
            self.deferred = Some(DeferredDiagnostics::default());
        }
    }

    /// Whether diagnostics are being buffered.
    pub fn is_deferring(&self) -> bool
    {
        self.deferred.is_some()
    }

    /// The buffered diagnostics, oldest first.
    pub fn deferred(&self) -> &[Diagnostic]
    {
        self.deferred.as_ref().map_or(&[][..], DeferredDiagnostics::as_slice)
    }

    /// Whether a buffered diagnostic is an unrecoverable error.
    pub fn unrecoverable_error(&self) -> bool
    {
        self.deferred.as_ref()
            .map_or(false, DeferredDiagnostics::unrecoverable_error)
    }

    /// Stop buffering and replay the buffered diagnostics
    /// accepted by `accept`, oldest first.
    ///
    /// Rejected diagnostics are dropped.
    /// Returns the number of dropped diagnostics.
    pub fn report_deferred<F>(&mut self, accept: F) -> usize
        where F: FnMut(&Diagnostic) -> bool
    {
        let Some(deferred) = self.deferred.take() else { return 0 };
        let (accepted, dropped): (Vec<_>, Vec<_>) =
            deferred.into_iter().partition(accept);
        for diagnostic in accepted {
            self.emit(diagnostic);
        }
        if !dropped.is_empty() {
            tracing::debug!(dropped = dropped.len(),
                            "dropped deferred diagnostics");
        }
        dropped.len()
    }

    /// Forward the final error and warning counts to the sink.
    pub fn print_counts(&mut self)
    {
        self.sink.summary(self.errors, self.warnings);
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> io::Result<()>
    {
        self.sink.flush()
    }
}
