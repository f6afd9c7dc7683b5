//! Draining the todo queue according to the compile policy.
//!
//! Each phase takes the output of the previous phase and
//! checks the stop policy before doing any work, so an empty
//! batch propagates forward once a phase decides to stop.

use {
    crate::{compiler::complete, Compiler},
    firn_core::{
        env::EnvId,
        error::Result,
        file::{FileKind, Location, OutputFile},
        options::CompilePolicy,
        state::CompileState,
        tree::ClassDecl,
    },
    std::io,
};

/// Lowered class declaration, with the environment it was lowered from.
pub type Lowered = (EnvId, ClassDecl);

impl Compiler
{
    /// Drive the pending environments through attribution,
    /// flow analysis, desugaring and code generation.
    pub(crate) fn compile_todo(&mut self) -> Result<()>
    {
        match self.cx.options.compile_policy {
            CompilePolicy::Simple => {
                let envs = self.cx.todo.take_all();
                let attributed = self.attribute_all(envs)?;
                let flowed = self.flow_all(attributed)?;
                let desugared = self.desugar_all(flowed)?;
                self.generate_all(desugared)?;
            },
            CompilePolicy::ByFile => {
                let mut groups =
                    self.cx.todo.take_grouped_by_file(&self.cx.envs);
                while !self.cx.should_stop(CompileState::Attr) {
                    let Some(group) = groups.pop_front() else { break };
                    let attributed = self.attribute_all(group)?;
                    let flowed = self.flow_all(attributed)?;
                    let desugared = self.desugar_all(flowed)?;
                    self.generate_all(desugared)?;
                }
            },
            CompilePolicy::ByTodo => {
                while let Some(env) = self.cx.todo.remove() {
                    let attributed = self.attribute(env)?;
                    let flowed = self.flow_all(vec![attributed])?;
                    let desugared = self.desugar_all(flowed)?;
                    self.generate_all(desugared)?;
                }
            },
        }
        Ok(())
    }

    /* ---------------------------------------------------------------------- */
    /*                                Attribute                               */
    /* ---------------------------------------------------------------------- */

    fn attribute_all(&mut self, envs: Vec<EnvId>) -> Result<Vec<EnvId>>
    {
        let mut results = Vec::with_capacity(envs.len());
        for env in envs {
            results.push(self.attribute(env)?);
        }
        Ok(self.cx.stop_if_error(CompileState::Attr, results))
    }

    /// Attribute an environment, unless it was attributed already.
    ///
    /// Attribution happens regardless of the stop policy;
    /// the policy is applied to the attributed batch.
    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn attribute(&mut self, env: EnvId) -> Result<EnvId>
    {
        if self.cx.compile_states.is_done(env, CompileState::Attr) {
            return Ok(env);
        }
        self.verbose("attribute", env);
        self.with_source(env, |this| {
            let result = this.phases.attribute.attribute(&mut this.cx, env);
            complete(&mut this.cx.log, result)?;
            if this.cx.error_count() > 0
                && !this.cx.should_stop(CompileState::Attr)
            {
                // Fail-over mode: finish attribution despite errors.
                let result = this.phases.attribute.post_attr(&mut this.cx, env);
                complete(&mut this.cx.log, result)?;
            }
            this.cx.compile_states.put(env, CompileState::Attr);
            Ok(env)
        })
    }

    /* ---------------------------------------------------------------------- */
    /*                                  Flow                                  */
    /* ---------------------------------------------------------------------- */

    fn flow_all(&mut self, envs: Vec<EnvId>) -> Result<Vec<EnvId>>
    {
        let mut results = Vec::with_capacity(envs.len());
        for env in envs {
            self.flow(env, &mut results)?;
        }
        Ok(self.cx.stop_if_error(CompileState::Flow, results))
    }

    /// Analyze an environment, unless it was analyzed already,
    /// and add it to `results` if later phases may see it.
    #[tracing::instrument(level = "trace", skip(self, results))]
    pub(crate) fn flow(&mut self, env: EnvId, results: &mut Vec<EnvId>)
        -> Result<()>
    {
        if self.cx.compile_states.is_done(env, CompileState::Flow) {
            results.push(env);
            return Ok(());
        }
        if self.cx.should_stop(CompileState::Flow) {
            return Ok(());
        }
        self.verbose("flow", env);
        self.with_source(env, |this| {
            let result = this.phases.flow.analyze(&mut this.cx, env);
            complete(&mut this.cx.log, result)?;
            this.cx.compile_states.put(env, CompileState::Flow);
            if !this.cx.should_stop(CompileState::Flow) {
                results.push(env);
            }
            Ok(())
        })
    }

    /* ---------------------------------------------------------------------- */
    /*                                 Desugar                                */
    /* ---------------------------------------------------------------------- */

    fn desugar_all(&mut self, envs: Vec<EnvId>) -> Result<Vec<Lowered>>
    {
        let mut results = Vec::new();
        for env in envs {
            self.desugar(env, &mut results)?;
        }
        Ok(self.cx.stop_if_error(CompileState::Flow, results))
    }

    /* ---------------------------------------------------------------------- */
    /*                                Generate                                */
    /* ---------------------------------------------------------------------- */

    fn generate_all(&mut self, classes: Vec<Lowered>) -> Result<()>
    {
        if self.cx.should_stop(CompileState::Generate) {
            return Ok(());
        }
        for (env, class) in classes {
            self.verbose(if self.cx.options.print_source { "generate source" }
                         else { "generate code" }, env);
            let proceed = self.with_source(env, |this| {
                let written = if this.cx.options.print_source {
                    this.print_source(&class)
                } else {
                    this.gen_code(env, &class)?
                };
                match written {
                    Ok(Some(file)) => {
                        tracing::debug!(%file, "wrote");
                        this.generated.push(file);
                        Ok(true)
                    },
                    Ok(None) =>
                        Ok(true),
                    Err(error) => {
                        this.cx.log.error("class.cant.write", format!(
                            "error while writing {}: {}", class.name, error));
                        Ok(false)
                    },
                }
            })?;
            if !proceed {
                break;
            }
        }
        Ok(())
    }

    /// Generate and write the class file for a lowered class.
    ///
    /// Nothing is written once any error was reported.
    fn gen_code(&mut self, env: EnvId, class: &ClassDecl)
        -> Result<io::Result<Option<OutputFile>>>
    {
        let result = self.phases.generate.gen_class(&mut self.cx, env, class);
        let Some(Some(image)) = complete(&mut self.cx.log, result)?
            else { return Ok(Ok(None)) };
        if self.cx.error_count() > 0 {
            return Ok(Ok(None));
        }
        Ok(self.write_output(&class.name, FileKind::Class, &image))
    }

    pub(crate) fn write_output(&mut self, class_name: &str, kind: FileKind,
                               contents: &[u8])
        -> io::Result<Option<OutputFile>>
    {
        let file_manager = &mut self.cx.file_manager;
        let file = file_manager.output_file(Location::ClassOutput,
                                            class_name, kind)?;
        file_manager.write(&file, contents)?;
        Ok(Some(file))
    }
}
