use {
    firn_core::{
        file::{Closeable, FileKind, FileManager, Location, OutputFile},
        tree::SourceFile,
    },
    std::{
        cell::RefCell,
        collections::HashMap,
        io,
        path::{Path, PathBuf},
        rc::Rc,
    },
};

/// File manager that keeps every file in memory.
///
/// Clones share the same files, so a test can keep a clone
/// to inspect the outputs after handing one to the compiler.
///
/// | Location        | Kind   | Path                 |
/// | --------------- | ------ | -------------------- |
/// | `SourcePath`    | any    | `sourcepath/N.java`  |
/// | `ClassOutput`   | class  | `out/N.class`        |
/// | `ClassOutput`   | source | `out/N.java`         |
/// | `SourceOutput`  | any    | `gen/N.java`         |
#[derive(Clone, Default)]
pub struct MemoryFileManager
{
    state: Rc<RefCell<State>>,
}

#[derive(Default)]
struct State
{
    sources: HashMap<PathBuf, String>,
    outputs: HashMap<PathBuf, Vec<u8>>,
    written: Vec<PathBuf>,
    flushes: usize,
    closed: bool,
    fail_writes: bool,
    fail_close: bool,
}

impl MemoryFileManager
{
    /// Add a source file.
    pub fn add_source(&self, path: impl Into<PathBuf>, text: impl Into<String>)
        -> SourceFile
    {
        let path = path.into();
        self.state.borrow_mut().sources.insert(path.clone(), text.into());
        SourceFile::new(path)
    }

    /// Add a source file declaring `class_name` to the source path,
    /// where symbol entry may find it.
    pub fn add_source_path(&self, class_name: &str, text: impl Into<String>)
        -> SourceFile
    {
        self.add_source(source_path(class_name), text)
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self)
    {
        self.state.borrow_mut().fail_writes = true;
    }

    /// Make closing fail.
    pub fn fail_close(&self)
    {
        self.state.borrow_mut().fail_close = true;
    }

    /// The contents of an output file.
    pub fn output(&self, path: impl AsRef<Path>) -> Option<Vec<u8>>
    {
        self.state.borrow().outputs.get(path.as_ref()).cloned()
    }

    /// The contents of an output file, as text.
    pub fn output_text(&self, path: impl AsRef<Path>) -> Option<String>
    {
        self.output(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// The paths of the output files, in the order they were written.
    pub fn output_paths(&self) -> Vec<PathBuf>
    {
        self.state.borrow().written.clone()
    }

    /// How many times the file manager was flushed.
    pub fn flush_count(&self) -> usize
    {
        self.state.borrow().flushes
    }

    /// Whether the file manager was closed.
    pub fn is_closed(&self) -> bool
    {
        self.state.borrow().closed
    }
}

fn source_path(class_name: &str) -> PathBuf
{
    format!("sourcepath/{class_name}.java").into()
}

impl FileManager for MemoryFileManager
{
    fn read_source(&mut self, file: &SourceFile) -> io::Result<String>
    {
        let state = self.state.borrow();
        if let Some(text) = state.sources.get(file.path()) {
            return Ok(text.clone());
        }
        match state.outputs.get(file.path()) {
            Some(bytes) => String::from_utf8(bytes.clone())
                .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error)),
            None => Err(io::Error::new(io::ErrorKind::NotFound,
                                       format!("{file}: no such file"))),
        }
    }

    fn find_source(&mut self, class_name: &str) -> Option<SourceFile>
    {
        let path = source_path(class_name);
        self.state.borrow().sources.contains_key(&path)
            .then(|| SourceFile::new(path))
    }

    fn output_file(&mut self, location: Location, class_name: &str,
                   kind: FileKind) -> io::Result<OutputFile>
    {
        let path = match (location, kind) {
            (Location::SourcePath, _) => source_path(class_name),
            (Location::ClassOutput, kind) =>
                format!("out/{class_name}{}", kind.extension()).into(),
            (Location::SourceOutput, _) =>
                format!("gen/{class_name}.java").into(),
        };
        Ok(OutputFile{location, kind, class_name: class_name.into(), path})
    }

    fn write(&mut self, file: &OutputFile, contents: &[u8]) -> io::Result<()>
    {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        state.outputs.insert(file.path.clone(), contents.to_vec());
        state.written.push(file.path.clone());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()>
    {
        self.state.borrow_mut().flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()>
    {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        if state.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "cannot close"));
        }
        Ok(())
    }
}

/// Closeable that records whether it was closed.
#[derive(Clone, Default)]
pub struct CloseFlag
{
    closed: Rc<RefCell<bool>>,
    fail: Option<&'static str>,
}

impl CloseFlag
{
    /// A closeable whose closing fails with `message`.
    pub fn failing(message: &'static str) -> Self
    {
        Self{closed: Rc::default(), fail: Some(message)}
    }

    /// Whether the closeable was closed.
    pub fn is_closed(&self) -> bool
    {
        *self.closed.borrow()
    }
}

impl Closeable for CloseFlag
{
    fn close(&mut self) -> io::Result<()>
    {
        *self.closed.borrow_mut() = true;
        match self.fail {
            Some(message) => Err(io::Error::new(io::ErrorKind::Other, message)),
            None => Ok(()),
        }
    }
}
