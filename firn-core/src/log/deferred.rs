use {super::Diagnostic, std::vec};

/// Diagnostics buffered while annotation processing is active.
#[derive(Debug, Default)]
pub struct DeferredDiagnostics
{
    queue: Vec<Diagnostic>,
}

impl DeferredDiagnostics
{
    /// Buffer a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic)
    {
        self.queue.push(diagnostic);
    }

    /// The buffered diagnostics, oldest first.
    pub fn as_slice(&self) -> &[Diagnostic]
    {
        &self.queue
    }

    /// Whether any buffered diagnostic is an unrecoverable error.
    pub fn unrecoverable_error(&self) -> bool
    {
        self.queue.iter().any(Diagnostic::is_unrecoverable_error)
    }
}

impl IntoIterator for DeferredDiagnostics
{
    type Item = Diagnostic;
    type IntoIter = vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.queue.into_iter()
    }
}
