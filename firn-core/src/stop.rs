//! Deciding at each phase boundary whether to continue.

use {
    crate::{log::{Diagnostic, Log}, options::Options, state::CompileState},
};

/// Thresholds past which phases no longer run.
///
/// The decision depends on the log, which changes as phases run,
/// so it must be made afresh at every phase boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StopPolicy
{
    /// Last state to run once any error was reported.
    pub if_error: CompileState,

    /// Last state to run while no error was reported.
    pub if_no_error: CompileState,

    /// Treat warnings as errors.
    pub werror: bool,

    // Set once the warnings-as-errors error was reported.
    werror_reported: bool,
}

impl StopPolicy
{
    /// The stop policy configured by the options.
    pub fn from_options(options: &Options) -> Self
    {
        Self{
            if_error: options.should_stop_if_error,
            if_no_error: options.should_stop_if_no_error,
            werror: options.werror,
            werror_reported: false,
        }
    }

    /// The number of errors reported so far.
    ///
    /// When warnings are treated as errors and warnings but no errors
    /// were reported, this reports an error first.
    /// The error bypasses deferral so that it is counted immediately.
    /// It is reported at most once per policy.
    pub fn error_count(&mut self, log: &mut Log) -> usize
    {
        if self.werror && !self.werror_reported
            && log.error_count() == 0 && log.warning_count() > 0
        {
            self.werror_reported = true;
            log.report_now(Diagnostic::error(
                "warnings.and.werror",
                "warnings found and -Werror specified",
            ));
        }
        log.error_count()
    }

    /// The threshold that applies given the state of the log.
    pub fn threshold(&mut self, log: &mut Log) -> CompileState
    {
        if self.error_count(log) > 0 || log.unrecoverable_error() {
            self.if_error
        } else {
            self.if_no_error
        }
    }

    /// Whether work at `state` must not happen.
    pub fn should_stop(&mut self, log: &mut Log, state: CompileState) -> bool
    {
        let threshold = self.threshold(log);
        let stop = state.is_after(threshold);
        if stop {
            tracing::trace!(%state, %threshold, "stopping");
        }
        stop
    }
}

impl Default for StopPolicy
{
    fn default() -> Self
    {
        Self::from_options(&Options::default())
    }
}
