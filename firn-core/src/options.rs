//! Options that influence a compile run.
//!
//! Options are decoded from JSON by the surrounding tool.
//! Every field has a default, so an empty object is a valid configuration.

use {
    crate::state::CompileState,
    serde::{Deserialize, Serialize},
    std::{fmt, path::PathBuf, str::FromStr},
    thiserror::Error,
};

/// Batching strategy for the attribute, flow, desugar and generate loop.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilePolicy
{
    /// Every phase runs over the whole queue before the next one starts.
    Simple,

    /// Environments are batched by the file they were declared in.
    ByFile,

    /// Environments are driven through all phases one at a time.
    #[default]
    ByTodo,
}

impl CompilePolicy
{
    /// The conventional lower-case spelling.
    pub fn as_str(self) -> &'static str
    {
        match self {
            Self::Simple => "simple",
            Self::ByFile => "byfile",
            Self::ByTodo => "bytodo",
        }
    }
}

impl fmt::Display for CompilePolicy
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown compile policy.
#[derive(Debug, Error)]
#[error("Unknown compile policy `{0}`")]
pub struct UnknownCompilePolicy(pub String);

impl FromStr for CompilePolicy
{
    type Err = UnknownCompilePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s {
            "simple"               => Ok(Self::Simple),
            "byfile" | "by-file"   => Ok(Self::ByFile),
            "bytodo" | "by-todo"   => Ok(Self::ByTodo),
            _ => Err(UnknownCompilePolicy(s.to_owned())),
        }
    }
}

/// Whether and how annotation processing runs.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcMode
{
    /// Never run annotation processors.
    None,

    /// Run annotation processors and stop before attribution.
    Only,

    /// Run annotation processors and compile as usual.
    Full,
}

/// What happens to source files read implicitly
/// to resolve names not defined by the input files.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImplicitSourcePolicy
{
    /// Implicitly read files are attributed but never generated.
    None,

    /// Implicitly read files are compiled like input files.
    Class,
}

/// Options that influence a compile run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options
{
    /// Batching strategy.
    pub compile_policy: CompilePolicy,

    /// Last state to run once any error was reported.
    pub should_stop_if_error: CompileState,

    /// Last state to run while no error was reported.
    pub should_stop_if_no_error: CompileState,

    /// Treat warnings as errors.
    pub werror: bool,

    /// Annotation processing mode, if given.
    pub proc: Option<ProcMode>,

    /// Names of annotation processors to run, instead of discovery.
    pub processors: Option<Vec<String>>,

    /// Where to discover annotation processors.
    pub processor_path: Option<PathBuf>,

    /// Policy for implicitly read source files, if given.
    pub implicit: Option<ImplicitSourcePolicy>,

    /// Emit lowered source instead of class files.
    pub print_source: bool,

    /// Maximum number of errors to show.
    pub max_errors: usize,

    /// Maximum number of warnings to show.
    pub max_warnings: usize,

    /// Note every phase invocation.
    pub verbose_compile_policy: bool,
}

impl Default for Options
{
    fn default() -> Self
    {
        Self{
            compile_policy: CompilePolicy::default(),
            should_stop_if_error: CompileState::Init,
            should_stop_if_no_error: CompileState::Generate,
            werror: false,
            proc: None,
            processors: None,
            processor_path: None,
            implicit: None,
            print_source: false,
            max_errors: 100,
            max_warnings: 100,
            verbose_compile_policy: false,
        }
    }
}

/// Returned when options cannot be decoded.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error
{
    #[error("Cannot read options: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot decode options: {0}")]
    Json(#[from] serde_json::Error),
}

impl Options
{
    /// Decode options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, Error>
    {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode options from a reader yielding a JSON document.
    pub fn from_json<R>(reader: R) -> Result<Self, Error>
        where R: std::io::Read
    {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Whether the options ask for annotation processing explicitly.
    ///
    /// Processing is explicitly requested by naming processors,
    /// giving a processor path, or asking for `proc = only`.
    pub fn explicit_annotation_processing_requested(&self) -> bool
    {
        self.processors.is_some()
            || self.processor_path.is_some()
            || self.proc == Some(ProcMode::Only)
    }
}
