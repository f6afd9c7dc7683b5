//! Parsing and entering, shared by the first round and later rounds.

use {
    firn_core::{
        context::Context,
        env::UnitId,
        error::Result,
        phase::{Enter, ModuleResolver, Parser},
        tree::{CompilationUnit, SourceFile},
    },
    std::collections::HashSet,
};

/// Parse source files, skipping any file given more than once.
///
/// A file that cannot be read is reported and yields an empty unit.
pub fn parse_files(cx: &mut Context, parser: &mut dyn Parser,
                   files: &[SourceFile]) -> Vec<UnitId>
{
    let mut so_far = HashSet::new();
    let mut units = Vec::new();
    for file in files {
        if !so_far.insert(file) {
            tracing::debug!(%file, "skipping duplicate input");
            continue;
        }
        let prev = cx.log.use_source(Some(file.clone()));
        let unit = parse(cx, parser, file);
        cx.log.use_source(prev);
        units.push(cx.units.alloc(unit));
    }
    units
}

fn parse(cx: &mut Context, parser: &mut dyn Parser, file: &SourceFile)
    -> CompilationUnit
{
    cx.input_files.insert(file.clone());
    match cx.file_manager.read_source(file) {
        Ok(text) => {
            tracing::trace!(%file, len = text.len(), "parsing");
            parser.parse(&mut cx.log, file, &text)
        },
        Err(error) => {
            cx.log.error("error.reading.file",
                         format!("error reading {file}; {error}"));
            CompilationUnit::empty(file.clone())
        },
    }
}

/// Decide the modules of the given units.
pub fn init_modules(cx: &mut Context, modules: &mut dyn ModuleResolver,
                    units: &[UnitId]) -> Result<()>
{
    modules.init_modules(cx, units)
}

/// Enter the classes of the given units and remember them as inputs.
pub fn enter_trees(cx: &mut Context, enter: &mut dyn Enter, units: &[UnitId])
    -> Result<Vec<UnitId>>
{
    enter.enter(cx, units)?;
    cx.mark_enter_done();

    let roots: Vec<_> = units.iter()
        .flat_map(|&unit| &cx.units[unit].defs)
        .map(|decl| decl.name.clone())
        .collect();
    cx.root_classes.extend(roots);

    for &unit in units {
        cx.input_files.insert(cx.units[unit].source().clone());
    }

    tracing::debug!(units = units.len(), todo = cx.todo.len(), "entered");
    Ok(units.to_vec())
}
