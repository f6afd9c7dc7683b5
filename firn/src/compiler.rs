use {
    crate::{front, CompileError, Outcome},
    firn_core::{
        context::Context,
        env::{EnvId, UnitId},
        error::{PhaseError, Result},
        file::{Closeable, FileManager, OutputFile},
        log::{Diagnostic, DiagnosticSink, Log},
        options::{ImplicitSourcePolicy, Options},
        phase::{
            Attribute, Enter, Flow, Generate, Lowering, ModuleResolver,
            Parser, ProcessingEnvironment, Processor,
        },
        state::CompileState,
        tree::{ClassDecl, Name, SourceFile},
    },
    std::{
        any::Any,
        collections::{HashMap, HashSet},
        panic::{self, AssertUnwindSafe},
    },
};

/// The collaborators the compiler sequences.
#[allow(missing_docs)]
pub struct Phases
{
    pub parser: Box<dyn Parser>,
    pub modules: Box<dyn ModuleResolver>,
    pub enter: Box<dyn Enter>,
    pub attribute: Box<dyn Attribute>,
    pub flow: Box<dyn Flow>,
    pub lowering: Box<dyn Lowering>,
    pub generate: Box<dyn Generate>,
}

/// Drives source files through all phases of compilation.
///
/// A compiler can be used for one call to [`compile`][`Self::compile`].
/// Afterwards the counts of errors and warnings and the list of
/// generated files can still be queried.
pub struct Compiler
{
    pub(crate) cx: Context,
    pub(crate) phases: Phases,

    pub(crate) processing: Option<Box<dyn ProcessingEnvironment>>,
    pub(crate) process_annotations: bool,
    pub(crate) explicit_processors: bool,
    pub(crate) annotation_processing_occurred: bool,

    // Lowered classes of every environment that reached LOWER.
    pub(crate) desugared: HashMap<EnvId, Vec<ClassDecl>>,
    // Environments whose desugaring is underway.
    pub(crate) desugaring: HashSet<EnvId>,

    pub(crate) generated: Vec<OutputFile>,

    closeables: Vec<Box<dyn Closeable>>,
    used: bool,
    closed: bool,
}

impl Compiler
{
    /// Create a compiler.
    pub fn new(
        options: Options,
        sink: Box<dyn DiagnosticSink>,
        file_manager: Box<dyn FileManager>,
        phases: Phases,
    ) -> Self
    {
        Self{
            cx: Context::new(options, sink, file_manager),
            phases,
            processing: None,
            process_annotations: false,
            explicit_processors: false,
            annotation_processing_occurred: false,
            desugared: HashMap::new(),
            desugaring: HashSet::new(),
            generated: Vec::new(),
            closeables: Vec::new(),
            used: false,
            closed: false,
        }
    }

    /// Use `processing` to discover and run annotation processors.
    ///
    /// Without a processing environment, no annotation processing happens.
    pub fn with_processing_environment(
        mut self,
        processing: Box<dyn ProcessingEnvironment>,
    ) -> Self
    {
        self.processing = Some(processing);
        self
    }

    /// Register a resource to be closed when the compiler is closed.
    pub fn register_closeable(&mut self, closeable: Box<dyn Closeable>)
    {
        self.closeables.push(closeable);
    }

    /// Compile source files.
    ///
    /// `class_names` names classes for annotation processing;
    /// the form `module/Name` also adds `module` to the root modules,
    /// as does every name in `extra_root_modules`.
    /// If `processors` is [`None`], processors are discovered.
    ///
    /// The compiler is closed before this returns, whatever happened.
    pub fn compile(
        &mut self,
        files: &[SourceFile],
        class_names: &[String],
        processors: Option<Vec<Box<dyn Processor>>>,
        extra_root_modules: &[Name],
    ) -> std::result::Result<Outcome, CompileError>
    {
        if self.used {
            return Err(CompileError::Reused);
        }
        self.used = true;

        tracing::info!(files = files.len(),
                       policy = %self.cx.options.compile_policy,
                       "compiling");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.compile_phases(files, class_names, processors,
                                extra_root_modules)
        }));
        let result = result.unwrap_or_else(|payload| {
            Err(PhaseError::Internal(anyhow::anyhow!(panic_message(payload))))
        });
        let translated = self.translate_result(result);

        // Diagnostics still buffered, e.g. after an early abort.
        self.cx.log.report_deferred(|_| true);
        let errors = self.cx.error_count();
        let warnings = self.cx.warning_count();
        self.cx.log.print_counts();

        let closed = self.close();
        translated?;
        closed?;

        let outcome = Outcome::from_counts(errors, warnings);
        tracing::info!(?outcome, "compiled");
        Ok(outcome)
    }

    fn compile_phases(
        &mut self,
        files: &[SourceFile],
        class_names: &[String],
        processors: Option<Vec<Box<dyn Processor>>>,
        extra_root_modules: &[Name],
    ) -> Result<()>
    {
        self.init_process_annotations(processors, files, class_names);

        for class_name in class_names {
            if let Some((module, _)) = class_name.split_once('/') {
                self.phases.modules.add_extra_root_module(module.into());
            }
        }
        for module in extra_root_modules {
            self.phases.modules.add_extra_root_module(module.clone());
        }

        let units = self.parse_files(files)?;
        let units = self.cx.stop_if_error(CompileState::Enter, units);
        let units = self.init_modules(units)?;
        let units = self.cx.stop_if_error(CompileState::Enter, units);
        let units = self.enter_trees(&units)?;
        self.process_annotations(&units, class_names)?;

        if self.cx.options.implicit == Some(ImplicitSourcePolicy::None) {
            let cx = &mut self.cx;
            cx.todo.retain_files(&cx.envs, &cx.units, &cx.input_files);
        }

        if !CompileState::Attr.is_after(self.cx.stop_policy.if_no_error) {
            self.compile_todo()?;
        }
        Ok(())
    }

    /// Parse source files, skipping any file given more than once.
    pub(crate) fn parse_files(&mut self, files: &[SourceFile])
        -> Result<Vec<UnitId>>
    {
        if self.cx.should_stop(CompileState::Parse) {
            return Ok(Vec::new());
        }
        Ok(front::parse_files(&mut self.cx, &mut *self.phases.parser, files))
    }

    fn init_modules(&mut self, units: Vec<UnitId>)
        -> Result<Vec<UnitId>>
    {
        front::init_modules(&mut self.cx, &mut *self.phases.modules, &units)?;
        Ok(units)
    }

    /// Enter the classes of compilation units into the symbol table.
    pub(crate) fn enter_trees(&mut self, units: &[UnitId])
        -> Result<Vec<UnitId>>
    {
        front::enter_trees(&mut self.cx, &mut *self.phases.enter, units)
    }

    /// Translate the result of the phases into the result of the run.
    ///
    /// Reports the conditions that call for a diagnostic.
    fn translate_result(&mut self, result: Result<()>)
        -> std::result::Result<(), CompileError>
    {
        match result {
            Ok(()) =>
                Ok(()),
            Err(PhaseError::Abort) => {
                tracing::debug!("aborted");
                Ok(())
            },
            Err(PhaseError::CompletionFailure{class, reason}) => {
                completion_error(&mut self.cx.log, &class, &reason);
                Ok(())
            },
            Err(PhaseError::ResourceExhausted(what)) => {
                self.cx.log.report_now(Diagnostic::error(
                    "compiler.err.resource.exhausted",
                    format!("the system is out of resources: {what}"),
                ));
                Err(CompileError::ResourceExhausted(what))
            },
            Err(PhaseError::Processing(error)) =>
                Err(CompileError::Processing(error)),
            Err(PhaseError::Internal(error)) => {
                if self.cx.error_count() == 0 {
                    self.cx.log.report_now(Diagnostic::error(
                        "compiler.err.bug",
                        format!("an exception has occurred in the compiler: \
                                 {error:#}"),
                    ));
                }
                Err(CompileError::Internal(error))
            },
        }
    }

    /// Flush and close everything the compiler holds on to.
    ///
    /// Every closeable is closed even if closing an earlier one failed;
    /// the last failure is returned.
    /// Closing a closed compiler does nothing.
    pub fn close(&mut self) -> std::result::Result<(), CompileError>
    {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cx.todo.clear();
        self.desugared.clear();

        let mut failure = None;
        let mut attempt = |result: std::io::Result<()>| {
            if let Err(error) = result {
                tracing::warn!(%error, "cannot close");
                failure = Some(error);
            }
        };
        attempt(self.cx.log.flush());
        attempt(self.cx.file_manager.flush());
        attempt(self.cx.file_manager.close());
        if let Some(processing) = &mut self.processing {
            attempt(processing.close());
        }
        for mut closeable in self.closeables.drain(..) {
            attempt(closeable.close());
        }

        match failure {
            Some(error) => Err(CompileError::Close(error)),
            None => Ok(()),
        }
    }

    /// The number of errors reported so far.
    pub fn error_count(&mut self) -> usize
    {
        self.cx.error_count()
    }

    /// The number of warnings reported so far.
    pub fn warning_count(&self) -> usize
    {
        self.cx.warning_count()
    }

    /// Files written by code generation, in the order they were written.
    pub fn generated(&self) -> &[OutputFile]
    {
        &self.generated
    }

    /// Whether annotation processors ran during the run.
    pub fn annotation_processing_occurred(&self) -> bool
    {
        self.annotation_processing_occurred
    }

    /// Forget the inputs and pending environments of the current round.
    pub fn new_round(&mut self)
    {
        self.cx.new_round();
    }

    /// Whether the classes of the current round were entered.
    pub fn is_enter_done(&self) -> bool
    {
        self.cx.is_enter_done()
    }

    /// The context of the run.
    pub fn context(&self) -> &Context
    {
        &self.cx
    }

    /// Run `f` with the file of `env` as the current source of the log.
    pub(crate) fn with_source<T>(
        &mut self,
        env: EnvId,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T>
    {
        let source = self.cx.source(env).clone();
        let prev = self.cx.log.use_source(Some(source));
        let result = f(self);
        self.cx.log.use_source(prev);
        result
    }

    /// Trace a phase invocation if asked to.
    pub(crate) fn verbose(&self, phase: &str, env: EnvId)
    {
        if self.cx.options.verbose_compile_policy {
            tracing::debug!("[{} {}]", phase, self.cx.envs[env].tree.name);
        }
    }
}

/// Turn a completion failure into an error diagnostic.
///
/// Other errors are passed through.
/// Returns [`None`] if the completion failure was reported.
pub(crate) fn complete<T>(log: &mut Log, result: Result<T>) -> Result<Option<T>>
{
    match result {
        Ok(value) =>
            Ok(Some(value)),
        Err(PhaseError::CompletionFailure{class, reason}) => {
            completion_error(log, &class, &reason);
            Ok(None)
        },
        Err(other) =>
            Err(other),
    }
}

fn completion_error(log: &mut Log, class: &str, reason: &str)
{
    log.error("cant.access", format!("cannot access {class}: {reason}"));
}

fn panic_message(payload: Box<dyn Any + Send>) -> String
{
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_owned()
    }
}
