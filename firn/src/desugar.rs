//! Lowering environments, ancestors first.
//!
//! Lowering a class synthesizes members that the lowering of its
//! subclasses relies on, and erasure destroys information that flow
//! analysis of a not yet analyzed superclass still needs.
//! So before an environment is lowered, every ancestor compiled in
//! this run is driven through attribution and flow analysis first.

use {
    crate::{compiler::complete, schedule::Lowered, Compiler},
    firn_core::{
        env::EnvId,
        error::Result,
        options::ImplicitSourcePolicy,
        state::CompileState,
        tree::{ClassDecl, Node, Tree},
    },
    smallvec::SmallVec,
    std::collections::{HashMap, HashSet},
};

/// What scanning the tree of an environment found.
#[derive(Debug, Default)]
pub struct Scan
{
    /// Environments of ancestors compiled in this run,
    /// ordered such that every environment comes after its own ancestors.
    pub dependencies: SmallVec<[EnvId; 4]>,

    /// Whether the scanned tree contains lambda expressions
    /// or method references.
    ///
    /// Only the tree of the scanned environment counts,
    /// not the trees of its dependencies.
    pub has_lambdas: bool,
}

impl Compiler
{
    /// Lower an environment and add its lowered classes to `results`.
    ///
    /// Lowering an environment again returns the same classes
    /// without lowering anything again.
    #[tracing::instrument(level = "trace", skip(self, results))]
    pub(crate) fn desugar(&mut self, env: EnvId, results: &mut Vec<Lowered>)
        -> Result<()>
    {
        if self.cx.should_stop(CompileState::TransTypes) {
            return Ok(());
        }

        if self.cx.options.implicit == Some(ImplicitSourcePolicy::None)
            && !self.cx.input_files.contains(self.cx.source(env))
        {
            return Ok(());
        }

        if self.cx.compile_states.is_done(env, CompileState::Lower) {
            if let Some(classes) = self.desugared.get(&env) {
                results.extend(classes.iter().map(|c| (env, c.clone())));
            }
            return Ok(());
        }

        // An ancestor that is itself being desugared further up
        // has reached flow analysis already; this only happens for
        // cyclic hierarchies.
        if !self.desugaring.insert(env) {
            tracing::debug!(%env, "already desugaring");
            return Ok(());
        }
        let result = self.desugar_with_dependencies(env, results);
        self.desugaring.remove(&env);
        result
    }

    fn desugar_with_dependencies(
        &mut self,
        env: EnvId,
        results: &mut Vec<Lowered>,
    ) -> Result<()>
    {
        let scan = self.scan(env);

        for &dependency in &scan.dependencies {
            if !self.cx.compile_states.is_done(dependency, CompileState::Flow) {
                self.force(dependency)?;
            }
        }

        // Forcing dependencies may have reported errors.
        if self.cx.should_stop(CompileState::TransTypes) {
            return Ok(());
        }

        self.with_source(env, |this| this.translate(env, scan.has_lambdas, results))
    }

    /// Drive an ancestor through attribution, flow analysis and lowering.
    ///
    /// The lowered classes are cached, for when the ancestor
    /// is taken off the todo queue later.
    fn force(&mut self, dependency: EnvId) -> Result<()>
    {
        tracing::debug!(%dependency, "forcing ancestor");
        let attributed = self.attribute(dependency)?;
        let mut flowed = Vec::new();
        self.flow(attributed, &mut flowed)?;
        let flowed = self.cx.stop_if_error(CompileState::Flow, flowed);
        let mut lowered = Vec::new();
        for env in flowed {
            self.desugar(env, &mut lowered)?;
        }
        Ok(())
    }

    /// Find the dependencies of an environment.
    ///
    /// The dependencies are the environments of the ancestors of every
    /// class declared in the tree, and transitively their dependencies.
    /// The search uses an explicit stack and visits every environment
    /// at most once, so it terminates for cyclic hierarchies.
    pub(crate) fn scan(&self, env: EnvId) -> Scan
    {
        let mut scan = Scan::default();

        // The state table keeps track of visited environments.
        // A false entry means the environment is currently being visited.
        // A true entry means the environment was visited in the past.
        let mut state: HashMap<EnvId, bool> = HashMap::new();
        let mut stack = vec![(env, false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                state.insert(current, true);
                if current != env {
                    scan.dependencies.push(current);
                }
                continue;
            }
            if state.contains_key(&current) {
                continue;
            }
            state.insert(current, false);
            stack.push((current, true));

            for node in self.cx.envs[current].tree.walk() {
                match node {
                    Node::Class(decl) =>
                        if let Some(ancestor) = self.ancestor_env(env, decl) {
                            if !state.contains_key(&ancestor) {
                                stack.push((ancestor, false));
                            }
                        },
                    Node::Member(Tree::Lambda{..} | Tree::MethodRef{..})
                        if current == env =>
                        scan.has_lambdas = true,
                    Node::Member(..) =>
                        (),
                }
            }
        }

        tracing::trace!(%env, dependencies = ?scan.dependencies,
                        has_lambdas = scan.has_lambdas, "scanned");
        scan
    }

    /// The environment of the nearest ancestor of `decl`
    /// compiled in this run, other than `root`.
    ///
    /// The walk up the superclass chain stops at the first ancestor
    /// with no environment. Ancestors in `root` are stepped over.
    fn ancestor_env(&self, root: EnvId, decl: &ClassDecl) -> Option<EnvId>
    {
        let symtab = &self.cx.symtab;
        let mut seen = HashSet::new();
        let mut next = decl.extends.clone();
        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                return None;
            }
            let symbol = symtab.lookup(&name)?;
            let outermost = symtab.outermost_class(symbol);
            match symtab.env(&outermost.name) {
                None => return None,
                Some(ancestor) if ancestor == root =>
                    next = symbol.superclass.clone(),
                Some(ancestor) => return Some(ancestor),
            }
        }
        None
    }

    /// Run the lowering passes over an environment.
    ///
    /// Every pass checks the stop policy and is skipped
    /// if the environment went through it already.
    fn translate(&mut self, env: EnvId, has_lambdas: bool,
                 results: &mut Vec<Lowered>) -> Result<()>
    {
        self.verbose("desugar", env);

        if !self.cx.compile_states.is_done(env, CompileState::TransTypes) {
            let result = self.phases.lowering.trans_types(&mut self.cx, env);
            if complete(&mut self.cx.log, result)?.is_none() {
                return Ok(());
            }
            self.cx.compile_states.put(env, CompileState::TransTypes);
        }

        if self.cx.should_stop(CompileState::TransPatterns) {
            return Ok(());
        }
        if !self.cx.compile_states.is_done(env, CompileState::TransPatterns) {
            let result = self.phases.lowering.trans_patterns(&mut self.cx, env);
            if complete(&mut self.cx.log, result)?.is_none() {
                return Ok(());
            }
            self.cx.compile_states.put(env, CompileState::TransPatterns);
        }

        if has_lambdas {
            if self.cx.should_stop(CompileState::Unlambda) {
                return Ok(());
            }
            if !self.cx.compile_states.is_done(env, CompileState::Unlambda) {
                let result =
                    self.phases.lowering.lambda_to_method(&mut self.cx, env);
                if complete(&mut self.cx.log, result)?.is_none() {
                    return Ok(());
                }
                self.cx.compile_states.put(env, CompileState::Unlambda);
            }
        }

        if self.cx.should_stop(CompileState::Lower) {
            return Ok(());
        }

        if self.cx.options.print_source {
            // Emit source only for the classes of the entered units,
            // with nested classes left in place.
            let tree = &self.cx.envs[env].tree;
            if self.cx.root_classes.contains(&tree.name) {
                results.push((env, tree.clone()));
            }
            return Ok(());
        }

        let result = self.phases.lowering.lower(&mut self.cx, env);
        let Some(classes) = complete(&mut self.cx.log, result)?
            else { return Ok(()) };
        self.cx.compile_states.put(env, CompileState::Lower);
        self.desugared.insert(env, classes.clone());

        if self.cx.should_stop(CompileState::Lower) {
            return Ok(());
        }
        results.extend(classes.into_iter().map(|c| (env, c)));
        Ok(())
    }
}
