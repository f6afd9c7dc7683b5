use {
    crate::{ToyParser, Trace},
    firn_core::{
        context::Context,
        env::{Env, EnvId, UnitId},
        error::Result,
        log::{Diagnostic, DiagnosticFlags},
        phase::{Enter, Parser},
        symbol::ClassSymbol,
        tree::{ClassDecl, CompilationUnit, Name, Tree},
    },
    std::collections::HashSet,
};

/// Enters classes into the symbol table.
///
/// Superclasses are named by their flat name.
/// A superclass not declared by any entered unit is looked up
/// on the class path, and then on the source path, from which it is
/// parsed and entered as an implicit unit.
pub struct SymbolEntry
{
    trace: Trace,
    parser: ToyParser,
    classpath: HashSet<Name>,

    // Classes whose superclass could not be resolved yet.
    unresolved: Vec<ClassSymbol>,
}

impl SymbolEntry
{
    /// Create symbol entry recording to `trace`.
    pub fn new(trace: Trace) -> Self
    {
        Self{
            trace,
            parser: ToyParser,
            classpath: HashSet::new(),
            unresolved: Vec::new(),
        }
    }

    /// Make a class available as if loaded from a class file.
    pub fn with_classpath_class(mut self, name: impl Into<Name>) -> Self
    {
        self.classpath.insert(name.into());
        self
    }

    fn enter_unit(&mut self, cx: &mut Context, unit: UnitId) -> Vec<ClassSymbol>
    {
        if let Some(package) = cx.units[unit].package.clone() {
            cx.symtab.enter_package(package);
        }
        let mut entered = Vec::new();
        let defs = cx.units[unit].defs.clone();
        for decl in defs {
            self.enter_class(cx, unit, decl, None, &mut entered);
        }
        entered
    }

    fn enter_class(
        &mut self,
        cx: &mut Context,
        unit: UnitId,
        decl: ClassDecl,
        enclosing: Option<(EnvId, &str)>,
        entered: &mut Vec<ClassSymbol>,
    )
    {
        let name: Name = match enclosing {
            Some((_, outer)) => format!("{outer}${}", decl.name).into(),
            None => decl.name.clone(),
        };
        self.trace.record("enter", &name);

        let symbol = ClassSymbol{
            name: name.clone(),
            superclass: None,
            enclosing: enclosing.map(|(_, outer)| outer.into()),
            unit: Some(unit),
        };
        if let Err(error) = cx.symtab.enter_class(symbol.clone()) {
            cx.log.report(Diagnostic::error("duplicate.class", error.to_string())
                .with_source(cx.units[unit].source().clone()));
            return;
        }
        entered.push(ClassSymbol{superclass: decl.extends.clone(), ..symbol});

        let nested = nested_classes(&decl.members);
        let env = cx.envs.alloc(Env{
            tree: decl,
            toplevel: unit,
            enclosing: enclosing.map(|(env, _)| env),
        });
        cx.symtab.set_env(name.clone(), env);
        if enclosing.is_none() {
            cx.todo.append(env);
        }

        for decl in nested {
            self.enter_class(cx, unit, decl, Some((env, &*name)), entered);
        }
    }

    /// Resolve the superclass of every class entered so far.
    ///
    /// Returns the classes whose superclass is still unknown.
    fn complete_superclasses(&mut self, cx: &mut Context) -> Vec<ClassSymbol>
    {
        let mut pending = std::mem::take(&mut self.unresolved);
        let mut unresolved = Vec::new();
        while let Some(mut symbol) = pending.pop() {
            let Some(superclass) = symbol.superclass.clone() else { continue };
            if cx.symtab.lookup(&superclass).is_none() {
                if self.classpath.contains(&superclass) {
                    cx.symtab.enter_class(ClassSymbol{
                        name: superclass.clone(),
                        superclass: None,
                        enclosing: None,
                        unit: None,
                    }).ok();
                } else if let Some(unit) = self.enter_implicit(cx, &superclass) {
                    pending.extend(self.enter_unit(cx, unit));
                }
            }
            if cx.symtab.lookup(&superclass).is_none() {
                unresolved.push(symbol);
                continue;
            }
            symbol.superclass = Some(superclass);
            // Replacing a symbol of the same unit cannot fail.
            cx.symtab.enter_class(symbol).ok();
        }
        unresolved
    }

    /// Parse the source file of a class found on the source path.
    fn enter_implicit(&mut self, cx: &mut Context, class_name: &str)
        -> Option<UnitId>
    {
        let file = cx.file_manager.find_source(class_name)?;
        tracing::debug!(%file, class_name, "found implicit source");
        let unit = match cx.file_manager.read_source(&file) {
            Ok(text) => self.parser.parse(&mut cx.log, &file, &text),
            Err(error) => {
                cx.log.report(Diagnostic::error("error.reading.file",
                        format!("error reading {file}; {error}"))
                    .with_source(file.clone()));
                CompilationUnit::empty(file)
            },
        };
        Some(cx.units.alloc(unit))
    }
}

impl Enter for SymbolEntry
{
    fn enter(&mut self, cx: &mut Context, units: &[UnitId]) -> Result<()>
    {
        for name in &self.classpath {
            cx.symtab.enter_class(ClassSymbol{
                name: name.clone(),
                superclass: None,
                enclosing: None,
                unit: None,
            }).ok();
        }

        for &unit in units {
            let entered = self.enter_unit(cx, unit);
            // Units entered again in a later round replace their classes.
            self.unresolved.retain(|s| !entered.iter().any(|e| e.name == s.name));
            self.unresolved.extend(entered);
        }

        let unresolved = self.complete_superclasses(cx);

        // Attribution reports unknown superclasses, unless diagnostics
        // are deferred, in which case a processor may still generate them.
        if cx.log.is_deferring() {
            for symbol in &unresolved {
                let Some(unit) = symbol.unit else { continue };
                let superclass = symbol.superclass.as_deref().unwrap_or_default();
                cx.log.report(Diagnostic::error("cant.resolve",
                        format!("cannot find symbol: class {superclass}"))
                    .with_flags(DiagnosticFlags::RECOVERABLE
                              | DiagnosticFlags::RESOLVE_ERROR)
                    .with_source(cx.units[unit].source().clone()));
            }
        }
        self.unresolved = unresolved;
        Ok(())
    }
}

/// The class declarations directly nested in `trees`,
/// including local classes in method bodies and lambdas.
fn nested_classes(trees: &[Tree]) -> Vec<ClassDecl>
{
    let mut nested = Vec::new();
    let mut stack: Vec<&Tree> = trees.iter().rev().collect();
    while let Some(tree) = stack.pop() {
        match tree {
            Tree::Class(decl) => nested.push(decl.clone()),
            Tree::Method{body, ..} | Tree::Lambda{body} =>
                stack.extend(body.iter().rev()),
            _ => (),
        }
    }
    nested
}

/// The flat name of the class of an environment, e.g. `Outer$Inner`.
pub fn flat_name(cx: &Context, env: EnvId) -> Name
{
    let mut names = vec![&*cx.envs[env].tree.name];
    let mut current = cx.envs[env].enclosing;
    while let Some(outer) = current {
        names.push(&*cx.envs[outer].tree.name);
        current = cx.envs[outer].enclosing;
    }
    names.reverse();
    names.join("$").into()
}
