use {
    crate::{flat_name, Trace},
    anyhow::anyhow,
    firn_core::{
        context::Context,
        env::EnvId,
        error::{PhaseError, Result},
        log::{Diagnostic, DiagnosticFlags},
        phase::Attribute,
        symbol::Symtab,
        tree::{ClassDecl, Name, Tree},
    },
};

/// Resolves class names and interprets diagnostic statements.
///
/// Names in `use` statements and method references are replaced
/// by the flat names they resolve to.
/// The statements `crash;`, `panic;`, `incomplete;` and `exhaust;` make
/// attribution fail with an internal error, a panic, a completion failure
/// and resource exhaustion respectively.
pub struct Attr
{
    trace: Trace,
}

impl Attr
{
    /// Create attribution recording to `trace`.
    pub fn new(trace: Trace) -> Self
    {
        Self{trace}
    }
}

impl Attribute for Attr
{
    fn attribute(&mut self, cx: &mut Context, env: EnvId) -> Result<()>
    {
        let name = flat_name(cx, env);
        self.trace.record("attribute", &name);

        let mut tree = cx.envs[env].tree.clone();
        let result = attrib_class(cx, &name, &mut tree);
        cx.envs[env].tree = tree;
        result
    }

    fn post_attr(&mut self, cx: &mut Context, env: EnvId) -> Result<()>
    {
        self.trace.record("post_attr", &flat_name(cx, env));
        Ok(())
    }
}

fn attrib_class(cx: &mut Context, scope: &str, decl: &mut ClassDecl)
    -> Result<()>
{
    if let Some(extends) = &decl.extends {
        if cx.symtab.lookup(extends).is_none() {
            cant_resolve(cx, extends);
        }
    }
    attrib_trees(cx, scope, &mut decl.members)
}

fn attrib_trees(cx: &mut Context, scope: &str, trees: &mut [Tree])
    -> Result<()>
{
    for tree in trees {
        match tree {
            Tree::Class(decl) => {
                let scope = format!("{scope}${}", decl.name);
                attrib_class(cx, &scope, decl)?;
            },
            Tree::Method{body, ..} | Tree::Lambda{body} =>
                attrib_trees(cx, scope, body)?,
            Tree::Ident(name) =>
                match resolve(&cx.symtab, scope, name) {
                    Some(resolved) => *name = resolved,
                    None => cant_resolve(cx, name),
                },
            Tree::MethodRef{qualifier, ..} =>
                match resolve(&cx.symtab, scope, qualifier) {
                    Some(resolved) => *qualifier = resolved,
                    None => cant_resolve(cx, qualifier),
                },
            Tree::Stmt(keyword) =>
                match &**keyword {
                    "warn" =>
                        cx.log.warning("warn.requested",
                                       format!("warning requested in {scope}")),
                    "error" =>
                        cx.log.error("error.requested",
                                     format!("error requested in {scope}")),
                    "crash" =>
                        return Err(PhaseError::Internal(
                            anyhow!("crash requested in {scope}"))),
                    "panic" =>
                        panic!("panic requested in {scope}"),
                    "incomplete" =>
                        return Err(PhaseError::completion_failure(
                            scope, "class file is incomplete")),
                    "exhaust" =>
                        return Err(PhaseError::ResourceExhausted(
                            format!("out of memory in {scope}"))),
                    _ => (),
                },
            Tree::Field{..} => (),
        }
    }
    Ok(())
}

/// Resolve a class name from inside the class `scope`.
///
/// Member classes of `scope` and of its enclosing classes
/// shadow top-level classes, innermost first.
fn resolve(symtab: &Symtab, scope: &str, name: &str) -> Option<Name>
{
    let mut scope = Some(scope);
    while let Some(current) = scope {
        if let Some(symbol) = symtab.lookup(&format!("{current}${name}")) {
            return Some(symbol.name.clone());
        }
        scope = current.rsplit_once('$').map(|(outer, _)| outer);
    }
    symtab.lookup(name).map(|symbol| symbol.name.clone())
}

fn cant_resolve(cx: &mut Context, name: &str)
{
    cx.log.report(Diagnostic::error("cant.resolve",
            format!("cannot find symbol: class {name}"))
        .with_flags(DiagnosticFlags::RESOLVE_ERROR));
}
