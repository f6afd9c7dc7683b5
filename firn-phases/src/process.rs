use {
    firn_core::{
        context::Context,
        env::UnitId,
        error::{PhaseError, Result},
        file::{FileKind, Location},
        phase::{
            GeneratedSource, ProcessingEnvironment, Processor,
            RoundEnvironment, Rounds,
        },
        tree::{Name, SourceFile},
    },
    std::{collections::HashSet, io},
};

/// Runs annotation processors round by round.
///
/// Each round the processors see the classes entered in that round.
/// Sources they generate are written to the source output location,
/// then parsed and entered for the next round, together with the
/// units of all previous rounds. Once a round generates nothing,
/// a final round runs with `processing_over` set.
#[derive(Default)]
pub struct RoundProcessingEnvironment
{
    discoverable: Vec<Box<dyn Processor>>,
    processors: Vec<Box<dyn Processor>>,

    // Classes named by the initial inputs, which must not be generated.
    initial_inputs: HashSet<String>,
}

impl RoundProcessingEnvironment
{
    /// Create a processing environment that discovers no processors.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Make a processor discoverable, as if found on the processor path.
    pub fn with_discoverable(mut self, processor: Box<dyn Processor>) -> Self
    {
        self.discoverable.push(processor);
        self
    }

    fn run_round(
        &mut self,
        rounds: &mut dyn Rounds,
        number: usize,
        root_classes: &[Name],
        processing_over: bool,
    ) -> Result<(Vec<GeneratedSource>, bool)>
    {
        tracing::debug!(number, processing_over, roots = root_classes.len(),
                        "processing round");
        let mut round =
            RoundEnvironment::new(number, root_classes.to_vec(), processing_over);
        for processor in &mut self.processors {
            processor.process(&mut round).map_err(|error| {
                PhaseError::Processing(error.context(format!(
                    "processor {} failed in round {number}", processor.name())))
            })?;
        }

        let log = &mut rounds.context().log;
        let error_raised = round.error_raised();
        for diagnostic in round.take_diagnostics() {
            log.report(diagnostic);
        }
        Ok((round.take_generated(), error_raised))
    }

    /// Write generated sources and return the files written.
    fn filer(&self, cx: &mut Context, generated: Vec<GeneratedSource>)
        -> Vec<SourceFile>
    {
        let mut files = Vec::new();
        for source in generated {
            let class_name = &source.class_name;
            if self.initial_inputs.contains(&**class_name)
                || cx.symtab.lookup(class_name).is_some()
            {
                cx.log.error("proc.type.recreate", format!(
                    "attempt to recreate a file for type {class_name}"));
                continue;
            }
            let file_manager = &mut cx.file_manager;
            let written = file_manager
                .output_file(Location::SourceOutput, class_name, FileKind::Source)
                .and_then(|file| {
                    file_manager.write(&file, source.text.as_bytes())?;
                    Ok(file)
                });
            match written {
                Ok(file) => {
                    tracing::debug!(%file, "generated source");
                    files.push(SourceFile::new(file.path));
                },
                Err(error) =>
                    cx.log.error("proc.cant.create.file", format!(
                        "cannot create file for {class_name}: {error}")),
            }
        }
        files
    }
}

/// The top-level classes declared by `units`.
fn declared_classes(cx: &Context, units: &[UnitId]) -> Vec<Name>
{
    units.iter()
        .flat_map(|&unit| &cx.units[unit].defs)
        .map(|decl| decl.name.clone())
        .collect()
}

impl ProcessingEnvironment for RoundProcessingEnvironment
{
    fn set_processors(&mut self, cx: &mut Context,
                      processors: Option<Vec<Box<dyn Processor>>>)
    {
        if let Some(processors) = processors {
            self.processors = processors;
            return;
        }
        let mut discovered = std::mem::take(&mut self.discoverable);
        let Some(names) = &cx.options.processors else {
            self.processors = discovered;
            return;
        };
        for name in names {
            match discovered.iter().position(|p| p.name() == name.as_str()) {
                Some(i) => self.processors.push(discovered.remove(i)),
                None => cx.log.error("proc.processor.not.found", format!(
                    "annotation processor '{name}' not found")),
            }
        }
    }

    fn at_least_one_processor(&self) -> bool
    {
        !self.processors.is_empty()
    }

    fn set_initial_state(&mut self, files: &[SourceFile],
                         class_names: &[String])
    {
        let stems = files.iter()
            .filter_map(|file| file.path().file_stem())
            .map(|stem| stem.to_string_lossy().into_owned());
        self.initial_inputs.extend(stems);
        self.initial_inputs.extend(class_names.iter().cloned());
    }

    fn do_processing(
        &mut self,
        rounds: &mut dyn Rounds,
        roots: &[UnitId],
        classes: &[Name],
        packages: &[Name],
    ) -> Result<bool>
    {
        let mut units = roots.to_vec();
        let mut root_classes = {
            let cx = rounds.context();
            let mut root_classes = declared_classes(cx, roots);
            root_classes.extend(classes.iter().cloned());
            let mut in_packages: Vec<Name> =
                cx.symtab.classes()
                .filter(|symbol| symbol.unit.map_or(false, |unit| {
                    cx.units[unit].package.as_ref()
                        .map_or(false, |package| packages.contains(package))
                }))
                .map(|symbol| symbol.name.clone())
                .collect();
            in_packages.sort();
            root_classes.extend(in_packages);
            root_classes
        };

        let mut number = 1;
        let mut error_raised;
        loop {
            let (generated, errors) =
                self.run_round(rounds, number, &root_classes, false)?;
            error_raised = errors;
            rounds.show_diagnostics(false)?;
            if generated.is_empty() || error_raised {
                break;
            }

            rounds.new_round();
            rounds.begin_round();
            let files = self.filer(rounds.context(), generated);
            let new_units = rounds.parse_files(&files)?;
            if rounds.unrecoverable_error() {
                break;
            }
            units.extend_from_slice(&new_units);
            rounds.enter_trees(&units)?;
            root_classes = declared_classes(rounds.context(), &new_units);
            number += 1;
        }

        if !error_raised {
            let (generated, _) = self.run_round(rounds, number + 1, &[], true)?;
            let log = &mut rounds.context().log;
            for source in generated {
                log.warning("proc.file.create.last.round", format!(
                    "file for type '{}' created in the last round will not \
                     be subject to annotation processing", source.class_name));
            }
        }
        rounds.show_diagnostics(true)?;
        Ok(true)
    }

    fn close(&mut self) -> io::Result<()>
    {
        self.processors.clear();
        Ok(())
    }
}
