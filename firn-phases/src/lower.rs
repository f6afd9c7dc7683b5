use {
    crate::{flat_name, Trace},
    anyhow::anyhow,
    firn_core::{
        context::Context,
        env::EnvId,
        error::{PhaseError, Result},
        phase::Lowering,
        state::CompileState,
        tree::{ClassDecl, Node, Tree},
    },
    std::collections::HashSet,
};

/// Lowering passes.
///
/// Erasure fails with an internal error when an ancestor compiled in
/// this run was not analyzed yet, since erasing would lose information
/// that flow analysis of the ancestor needs.
pub struct Lower
{
    trace: Trace,
}

impl Lower
{
    /// Create lowering recording to `trace`.
    pub fn new(trace: Trace) -> Self
    {
        Self{trace}
    }
}

impl Lowering for Lower
{
    fn trans_types(&mut self, cx: &mut Context, env: EnvId) -> Result<()>
    {
        let name = flat_name(cx, env);
        self.trace.record("trans_types", &name);

        let symtab = &cx.symtab;
        for node in cx.envs[env].tree.walk() {
            let Node::Class(decl) = node else { continue };
            let mut seen = HashSet::new();
            let mut next = decl.extends.clone();
            while let Some(superclass) = next {
                if !seen.insert(superclass.clone()) {
                    break;
                }
                let Some(symbol) = symtab.lookup(&superclass) else { break };
                let outermost = symtab.outermost_class(symbol);
                if let Some(ancestor) = symtab.env(&outermost.name) {
                    if ancestor != env
                        && !cx.compile_states.is_done(ancestor, CompileState::Flow)
                    {
                        return Err(PhaseError::Internal(anyhow!(
                            "{name} erased before flow analysis of {}",
                            outermost.name,
                        )));
                    }
                }
                next = symbol.superclass.clone();
            }
        }
        Ok(())
    }

    fn trans_patterns(&mut self, cx: &mut Context, env: EnvId) -> Result<()>
    {
        self.trace.record("trans_patterns", &flat_name(cx, env));
        Ok(())
    }

    fn lambda_to_method(&mut self, cx: &mut Context, env: EnvId) -> Result<()>
    {
        self.trace.record("lambda_to_method", &flat_name(cx, env));
        unlambda(&mut cx.envs[env].tree);
        Ok(())
    }

    fn lower(&mut self, cx: &mut Context, env: EnvId)
        -> Result<Vec<ClassDecl>>
    {
        let name = flat_name(cx, env);
        self.trace.record("lower", &name);
        let mut classes = Vec::new();
        flatten(cx.envs[env].tree.clone(), &name, false, &mut classes);
        Ok(classes)
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Lambdas                                  */
/* -------------------------------------------------------------------------- */

/// Turn the lambdas of a class into `lambda$N` methods of that class.
///
/// Lambdas and method references become `invokedynamic;` statements.
fn unlambda(decl: &mut ClassDecl)
{
    let mut lifted = Vec::new();
    for member in &mut decl.members {
        unlambda_tree(member, &mut lifted);
    }
    decl.members.extend(lifted);
}

fn unlambda_tree(tree: &mut Tree, lifted: &mut Vec<Tree>)
{
    match tree {
        Tree::Class(decl) =>
            unlambda(decl),
        Tree::Method{body, ..} =>
            body.iter_mut().for_each(|tree| unlambda_tree(tree, lifted)),
        Tree::Lambda{body} => {
            let mut body = std::mem::take(body);
            body.iter_mut().for_each(|tree| unlambda_tree(tree, lifted));
            let name = format!("lambda${}", lifted.len());
            lifted.push(Tree::Method{name: name.into(), body});
            *tree = Tree::Stmt("invokedynamic".into());
        },
        Tree::MethodRef{..} =>
            *tree = Tree::Stmt("invokedynamic".into()),
        Tree::Field{..} | Tree::Ident(..) | Tree::Stmt(..) =>
            (),
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Flattening                                 */
/* -------------------------------------------------------------------------- */

/// Hoist nested and local classes out of `decl`, outermost first.
///
/// Hoisted classes are named `Outer$Inner`
/// and get a `this$0` field referring to the enclosing instance.
fn flatten(mut decl: ClassDecl, name: &str, inner: bool,
           classes: &mut Vec<ClassDecl>)
{
    let mut nested = Vec::new();
    hoist(&mut decl.members, &mut nested);
    decl.name = name.into();
    if inner {
        decl.members.insert(0, Tree::Field{name: "this$0".into()});
    }
    classes.push(decl);
    for class in nested {
        let name = format!("{name}${}", class.name);
        flatten(class, &name, true, classes);
    }
}

fn hoist(trees: &mut Vec<Tree>, nested: &mut Vec<ClassDecl>)
{
    let mut kept = Vec::with_capacity(trees.len());
    for tree in trees.drain(..) {
        match tree {
            Tree::Class(decl) =>
                nested.push(decl),
            Tree::Method{name, mut body} => {
                hoist(&mut body, nested);
                kept.push(Tree::Method{name, body});
            },
            Tree::Lambda{mut body} => {
                hoist(&mut body, nested);
                kept.push(Tree::Lambda{body});
            },
            other =>
                kept.push(other),
        }
    }
    *trees = kept;
}
