//! State shared by all phases of one compile run.

use {
    crate::{
        env::{EnvId, Envs, Todo, Units},
        file::FileManager,
        log::{DiagnosticSink, Log},
        options::Options,
        state::{CompileState, CompileStates},
        stop::StopPolicy,
        symbol::Symtab,
        tree::{Name, SourceFile},
    },
    std::collections::HashSet,
};

/// State shared by all phases of one compile run.
///
/// The context is passed by reference to every phase.
/// It is owned by the compiler and dropped when the compiler is closed.
pub struct Context
{
    /// Options of the run.
    pub options: Options,

    /// Where diagnostics are reported.
    pub log: Log,

    /// When to stop, derived from the options.
    pub stop_policy: StopPolicy,

    /// Reads sources and writes outputs.
    pub file_manager: Box<dyn FileManager>,

    /// Parsed compilation units.
    pub units: Units,

    /// Environments of entered classes.
    pub envs: Envs,

    /// Classes and packages known to the run.
    pub symtab: Symtab,

    /// Environments awaiting attribution.
    pub todo: Todo,

    /// How far each environment has progressed.
    pub compile_states: CompileStates,

    /// Files whose classes are to be generated,
    /// as opposed to files read to resolve names.
    pub input_files: HashSet<SourceFile>,

    /// Top-level classes of the entered compilation units.
    ///
    /// When emitting source, only these classes are emitted.
    pub root_classes: HashSet<Name>,

    enter_done: bool,
}

impl Context
{
    /// Create the context for a compile run.
    pub fn new(
        options: Options,
        sink: Box<dyn DiagnosticSink>,
        file_manager: Box<dyn FileManager>,
    ) -> Self
    {
        let log = Log::new(sink, options.max_errors, options.max_warnings);
        let stop_policy = StopPolicy::from_options(&options);
        Self{
            options,
            log,
            stop_policy,
            file_manager,
            units: Units::default(),
            envs: Envs::default(),
            symtab: Symtab::default(),
            todo: Todo::default(),
            compile_states: CompileStates::default(),
            input_files: HashSet::new(),
            root_classes: HashSet::new(),
            enter_done: false,
        }
    }

    /// The file the class of `env` was declared in.
    pub fn source(&self, env: EnvId) -> &SourceFile
    {
        self.units[self.envs[env].toplevel].source()
    }

    /// The number of errors reported so far.
    ///
    /// See [`StopPolicy::error_count`] for how this may report an error.
    pub fn error_count(&mut self) -> usize
    {
        self.stop_policy.error_count(&mut self.log)
    }

    /// The number of warnings reported so far.
    pub fn warning_count(&self) -> usize
    {
        self.log.warning_count()
    }

    /// Whether work at `state` must not happen.
    pub fn should_stop(&mut self, state: CompileState) -> bool
    {
        self.stop_policy.should_stop(&mut self.log, state)
    }

    /// Pass `items` through unless work at `state` must not happen,
    /// in which case nothing is passed through.
    pub fn stop_if_error<T>(&mut self, state: CompileState, items: Vec<T>)
        -> Vec<T>
    {
        if self.should_stop(state) { Vec::new() } else { items }
    }

    /// Forget the inputs and pending environments,
    /// so that another processing round can enter its classes.
    pub fn new_round(&mut self)
    {
        self.input_files.clear();
        self.todo.clear();
        self.enter_done = false;
    }

    /// Record that the classes of the current round were entered.
    pub fn mark_enter_done(&mut self)
    {
        self.enter_done = true;
    }

    /// Whether the classes of the current round were entered.
    pub fn is_enter_done(&self) -> bool
    {
        self.enter_done
    }
}
