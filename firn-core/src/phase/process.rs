use {
    crate::{
        context::Context,
        env::UnitId,
        error::{PhaseError, Result},
        log::Diagnostic,
        tree::{Name, SourceFile},
    },
    std::io,
};

/// Annotation processor.
pub trait Processor
{
    /// The name by which the processor can be selected.
    fn name(&self) -> &str;

    /// Process one round.
    ///
    /// Returning an error ends the compile run.
    fn process(&mut self, round: &mut RoundEnvironment) -> anyhow::Result<()>;
}

/// Source file generated by an annotation processor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneratedSource
{
    /// Flat name of the class the source declares.
    pub class_name: Name,

    /// Source text.
    pub text: String,
}

/// What a processor sees of a processing round.
#[derive(Debug)]
pub struct RoundEnvironment
{
    /// One-based number of the round.
    pub number: usize,

    /// Classes declared by the root compilation units,
    /// followed by the classes named explicitly.
    pub root_classes: Vec<Name>,

    /// Whether this is the final round,
    /// in which no new sources should be generated.
    pub processing_over: bool,

    generated: Vec<GeneratedSource>,
    diagnostics: Vec<Diagnostic>,
}

impl RoundEnvironment
{
    /// Create the environment for a round.
    pub fn new(number: usize, root_classes: Vec<Name>, processing_over: bool)
        -> Self
    {
        Self{
            number,
            root_classes,
            processing_over,
            generated: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Generate a source file declaring `class_name`.
    pub fn generate_source(&mut self, class_name: impl Into<Name>,
                           text: impl Into<String>)
    {
        self.generated.push(GeneratedSource{
            class_name: class_name.into(),
            text: text.into(),
        });
    }

    /// Report a diagnostic on behalf of the processor.
    pub fn report(&mut self, diagnostic: Diagnostic)
    {
        self.diagnostics.push(diagnostic);
    }

    /// Whether a processor reported an error this round.
    pub fn error_raised(&self) -> bool
    {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Remove the sources generated so far.
    pub fn take_generated(&mut self) -> Vec<GeneratedSource>
    {
        std::mem::take(&mut self.generated)
    }

    /// Remove the diagnostics reported so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic>
    {
        std::mem::take(&mut self.diagnostics)
    }
}

/// Discovers and runs annotation processors.
pub trait ProcessingEnvironment
{
    /// Select the processors to run.
    ///
    /// If `processors` is [`None`], processors are discovered
    /// as configured by the options.
    fn set_processors(&mut self, cx: &mut Context,
                      processors: Option<Vec<Box<dyn Processor>>>);

    /// Whether any processor was selected.
    fn at_least_one_processor(&self) -> bool;

    /// Remember the files and class names given to the compile run,
    /// so that processors cannot generate over them.
    fn set_initial_state(&mut self, _files: &[SourceFile],
                         _class_names: &[String])
    {
    }

    /// Run processing rounds until no processor generates new sources.
    ///
    /// Rounds after the first are set up through `rounds`.
    /// Returns whether any processing occurred.
    fn do_processing(
        &mut self,
        rounds: &mut dyn Rounds,
        roots: &[UnitId],
        classes: &[Name],
        packages: &[Name],
    ) -> Result<bool>;

    /// Release the processors.
    fn close(&mut self) -> io::Result<()>
    {
        Ok(())
    }
}

/// Handle through which a processing environment re-enters the driver
/// to set up further rounds.
pub trait Rounds
{
    /// The context of the compile run.
    fn context(&mut self) -> &mut Context;

    /// Parse source files, typically ones generated by processors.
    fn parse_files(&mut self, files: &[SourceFile]) -> Result<Vec<UnitId>>;

    /// Enter the classes of compilation units into the symbol table.
    fn enter_trees(&mut self, units: &[UnitId]) -> Result<Vec<UnitId>>;

    /// Forget the inputs and pending environments of the previous round.
    fn new_round(&mut self)
    {
        self.context().new_round();
    }

    /// Start buffering diagnostics for a new round.
    fn begin_round(&mut self)
    {
        self.context().log.defer();
    }

    /// Replay the diagnostics buffered during the round.
    ///
    /// Unless `show_all` is set, recoverable errors are dropped,
    /// since a later round may fix them.
    /// If an unrecoverable error was buffered, everything is replayed
    /// and processing is aborted.
    fn show_diagnostics(&mut self, show_all: bool) -> Result<()>
    {
        let log = &mut self.context().log;
        let unrecoverable = log.unrecoverable_error();
        if show_all || unrecoverable {
            log.report_deferred(|_| true);
        } else {
            log.report_deferred(|d| !d.is_recoverable_error());
        }
        if unrecoverable {
            return Err(PhaseError::Abort);
        }
        Ok(())
    }

    /// The number of errors reported so far.
    fn error_count(&mut self) -> usize
    {
        self.context().error_count()
    }

    /// Whether an unrecoverable error is buffered.
    fn unrecoverable_error(&mut self) -> bool
    {
        self.context().log.unrecoverable_error()
    }

    /// Whether the classes of the current round were entered.
    fn is_enter_done(&mut self) -> bool
    {
        self.context().is_enter_done()
    }
}
