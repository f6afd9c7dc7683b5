//! Annotation processing between entering and attribution.
//!
//! While annotation processing is active, every diagnostic is deferred,
//! because processors may still generate sources that fix them.

use {
    crate::{compiler::{complete, Phases}, front, Compiler},
    firn_core::{
        context::Context,
        env::UnitId,
        error::{PhaseError, Result},
        options::ProcMode,
        phase::{Processor, Rounds},
        state::CompileState,
        tree::{Name, SourceFile},
    },
};

impl Compiler
{
    /// Decide whether annotation processing will run,
    /// and start deferring diagnostics if so.
    pub(crate) fn init_process_annotations(
        &mut self,
        processors: Option<Vec<Box<dyn Processor>>>,
        files: &[SourceFile],
        class_names: &[String],
    )
    {
        if processors.as_ref().map_or(false, |p| !p.is_empty()) {
            self.explicit_processors = true;
        }

        if self.cx.options.proc == Some(ProcMode::None) {
            self.process_annotations = false;
            return;
        }
        let explicit = self.explicit_annotation_processing_requested();
        let Some(processing) = &mut self.processing else {
            self.process_annotations = false;
            return;
        };

        processing.set_processors(&mut self.cx, processors);
        self.process_annotations = processing.at_least_one_processor();
        tracing::debug!(process_annotations = self.process_annotations,
                        "initialized annotation processing");

        if self.process_annotations {
            if !explicit {
                self.cx.log.note(
                    "implicit.annotation.processing",
                    "annotation processing is enabled because one or more \
                     processors were found; a future release may disable \
                     annotation processing unless it is explicitly requested",
                );
            }
            self.cx.log.defer();
            processing.set_initial_state(files, class_names);
        }
    }

    /// Whether annotation processing was asked for by the caller,
    /// rather than enabled by discovering processors.
    pub(crate) fn explicit_annotation_processing_requested(&self) -> bool
    {
        self.explicit_processors
            || self.cx.options.explicit_annotation_processing_requested()
    }

    /// Run annotation processing over the entered units.
    ///
    /// The processing environment is called once
    /// and sets up any further rounds itself.
    pub(crate) fn process_annotations(
        &mut self,
        roots: &[UnitId],
        class_names: &[String],
    ) -> Result<()>
    {
        if self.cx.should_stop(CompileState::Process) {
            // Errors that processors cannot fix, such as syntax errors.
            if self.process_annotations {
                self.cx.log.report_deferred(|_| true);
                return Ok(());
            }
        }

        if !self.process_annotations {
            if self.cx.options.proc == Some(ProcMode::Only) {
                self.cx.log.warning(
                    "proc.proc-only.requested.no.procs",
                    "annotation processing without compilation requested \
                     but no processors were found",
                );
                self.cx.todo.clear();
            }
            if !class_names.is_empty() {
                self.no_explicit_processing_requested(class_names);
            }
            return Ok(());
        }

        let mut classes = Vec::new();
        let mut packages = Vec::new();
        if !class_names.is_empty() {
            if !self.explicit_annotation_processing_requested() {
                self.no_explicit_processing_requested(class_names);
                self.cx.log.report_deferred(|_| true);
                return Ok(());
            }
            let mut errors = false;
            for class_name in class_names {
                let name = class_name.split_once('/')
                    .map_or(class_name.as_str(), |(_, name)| name);
                if let Some(symbol) = self.cx.symtab.lookup(name) {
                    classes.push(symbol.name.clone());
                } else if self.cx.symtab.lookup_package(name) {
                    packages.push(Name::from(name));
                } else {
                    self.cx.log.error("proc.cant.find.class", format!(
                        "could not find class file for '{class_name}'"));
                    errors = true;
                }
            }
            if errors {
                self.cx.log.report_deferred(|_| true);
                return Ok(());
            }
        }

        let Some(mut processing) = self.processing.take() else {
            return Err(PhaseError::Internal(anyhow::anyhow!(
                "annotation processing without a processing environment")));
        };
        let result = {
            let mut rounds = RoundHost{cx: &mut self.cx, phases: &mut self.phases};
            processing.do_processing(&mut rounds, roots, &classes, &packages)
        };
        self.processing = Some(processing);

        match complete(&mut self.cx.log, result)? {
            Some(occurred) =>
                self.annotation_processing_occurred = occurred,
            None =>
                { self.cx.log.report_deferred(|_| true); },
        }

        if self.cx.options.proc == Some(ProcMode::Only) {
            self.cx.todo.clear();
        }
        Ok(())
    }

    fn no_explicit_processing_requested(&mut self, class_names: &[String])
    {
        self.cx.log.error(
            "proc.no.explicit.annotation.processing.requested",
            format!("class names, '{}', are only accepted if annotation \
                     processing is explicitly requested",
                    class_names.join(", ")),
        );
    }
}

/// Lets the processing environment re-enter the driver between rounds.
struct RoundHost<'a>
{
    cx: &'a mut Context,
    phases: &'a mut Phases,
}

impl Rounds for RoundHost<'_>
{
    fn context(&mut self) -> &mut Context
    {
        self.cx
    }

    fn parse_files(&mut self, files: &[SourceFile]) -> Result<Vec<UnitId>>
    {
        // Generated files are parsed even after errors,
        // so that their own errors are found.
        Ok(front::parse_files(self.cx, &mut *self.phases.parser, files))
    }

    fn enter_trees(&mut self, units: &[UnitId]) -> Result<Vec<UnitId>>
    {
        front::init_modules(self.cx, &mut *self.phases.modules, units)?;
        front::enter_trees(self.cx, &mut *self.phases.enter, units)
    }
}
