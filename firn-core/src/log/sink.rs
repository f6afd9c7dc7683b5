use {
    super::Diagnostic,
    std::{cell::RefCell, io::{self, Write}, rc::Rc},
};

/// Where the log forwards diagnostics to.
pub trait DiagnosticSink
{
    /// Show a diagnostic to the user.
    fn report(&mut self, diagnostic: &Diagnostic);

    /// Show the total numbers of errors and warnings at the end of a run.
    fn summary(&mut self, _errors: usize, _warnings: usize)
    {
    }

    /// Flush any buffered output.
    fn flush(&mut self) -> io::Result<()>
    {
        Ok(())
    }
}

/// Writes diagnostics as lines of text.
///
/// Write errors are remembered and returned from the next flush,
/// since reporting a diagnostic cannot fail.
pub struct WriterSink<W>
{
    writer: W,
    error: Option<io::Error>,
}

impl<W> WriterSink<W>
{
    /// Create a sink writing to `writer`.
    pub fn new(writer: W) -> Self
    {
        Self{writer, error: None}
    }

    /// Stop writing and return the writer.
    pub fn into_inner(self) -> W
    {
        self.writer
    }
}

impl<W> WriterSink<W>
    where W: Write
{
    fn write_line(&mut self, args: std::fmt::Arguments)
    {
        if self.error.is_none() {
            self.error = writeln!(self.writer, "{}", args).err();
        }
    }
}

impl<W> DiagnosticSink for WriterSink<W>
    where W: Write
{
    fn report(&mut self, diagnostic: &Diagnostic)
    {
        self.write_line(format_args!("{}", diagnostic));
    }

    fn summary(&mut self, errors: usize, warnings: usize)
    {
        fn plural(n: usize, what: &str) -> String
        {
            if n == 1 { format!("1 {what}") } else { format!("{n} {what}s") }
        }
        if errors > 0 {
            self.write_line(format_args!("{}", plural(errors, "error")));
        }
        if warnings > 0 {
            self.write_line(format_args!("{}", plural(warnings, "warning")));
        }
    }

    fn flush(&mut self) -> io::Result<()>
    {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()
    }
}

/// Collects diagnostics in memory.
///
/// Clones share the same collection,
/// so a clone kept by the caller observes what the log reported.
#[derive(Clone, Debug, Default)]
pub struct CollectSink
{
    diagnostics: Rc<RefCell<Vec<Diagnostic>>>,
    summary: Rc<RefCell<Option<(usize, usize)>>>,
}

impl CollectSink
{
    /// The diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic>
    {
        self.diagnostics.borrow().clone()
    }

    /// The codes of the diagnostics reported so far.
    pub fn codes(&self) -> Vec<&'static str>
    {
        self.diagnostics.borrow().iter().map(|d| d.code).collect()
    }

    /// The counts passed to the summary, if it was shown.
    pub fn summary(&self) -> Option<(usize, usize)>
    {
        *self.summary.borrow()
    }
}

impl DiagnosticSink for CollectSink
{
    fn report(&mut self, diagnostic: &Diagnostic)
    {
        self.diagnostics.borrow_mut().push(diagnostic.clone());
    }

    fn summary(&mut self, errors: usize, warnings: usize)
    {
        *self.summary.borrow_mut() = Some((errors, warnings));
    }
}
