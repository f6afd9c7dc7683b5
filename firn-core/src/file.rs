//! Reading sources and writing outputs.
//!
//! Path resolution is up to the file manager.
//! The driver only names files by location and class name.

use {
    crate::tree::{Name, SourceFile},
    std::{fmt, io, path::PathBuf},
};

/// Where a file lives.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Location
{
    SourcePath,
    ClassOutput,
    SourceOutput,
}

/// What a file contains.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FileKind
{
    /// Source code.
    Source,

    /// Class file.
    Class,
}

impl FileKind
{
    /// The file name extension for this kind, including the dot.
    pub fn extension(self) -> &'static str
    {
        match self {
            Self::Source => ".java",
            Self::Class  => ".class",
        }
    }
}

/// Handle to a file written by the compiler.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OutputFile
{
    /// Where the file was written.
    pub location: Location,

    /// What the file contains.
    pub kind: FileKind,

    /// Flat name of the class the file was written for.
    pub class_name: Name,

    /// Pathname of the file, as resolved by the file manager.
    pub path: PathBuf,
}

impl fmt::Display for OutputFile
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "{}", self.path.display())
    }
}

/// Resolves, reads and writes files.
pub trait FileManager
{
    /// Read the text of a source file.
    fn read_source(&mut self, file: &SourceFile) -> io::Result<String>;

    /// Find the source file declaring a class that was not among the inputs.
    ///
    /// Returns [`None`] if there is no source path
    /// or the class is not found on it.
    fn find_source(&mut self, _class_name: &str) -> Option<SourceFile>
    {
        None
    }

    /// Resolve the output file for a class.
    ///
    /// Nothing is written until [`write`][`Self::write`] is called.
    fn output_file(&mut self, location: Location, class_name: &str,
                   kind: FileKind) -> io::Result<OutputFile>;

    /// Write the contents of an output file.
    fn write(&mut self, file: &OutputFile, contents: &[u8]) -> io::Result<()>;

    /// Whether an output file is the same file as an input source file.
    fn is_same_file(&self, output: &OutputFile, source: &SourceFile) -> bool
    {
        output.path == source.path()
    }

    /// Flush buffered writes.
    fn flush(&mut self) -> io::Result<()>
    {
        Ok(())
    }

    /// Release resources held by the file manager.
    fn close(&mut self) -> io::Result<()>
    {
        Ok(())
    }
}

/// Resource that must be closed when the compiler is closed.
pub trait Closeable
{
    /// Release the resource.
    fn close(&mut self) -> io::Result<()>;
}
