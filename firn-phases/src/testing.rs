use {
    crate::MemoryFileManager,
    firn_core::{context::Context, log::CollectSink, options::Options},
};

/// A context with default options reading from `files`.
pub fn context(files: MemoryFileManager) -> (Context, CollectSink)
{
    let sink = CollectSink::default();
    let cx = Context::new(Options::default(), Box::new(sink.clone()),
                          Box::new(files));
    (cx, sink)
}
