//! Object-safe traits for the collaborators the driver sequences.
//!
//! Each phase receives the [context][`Context`] of the compile run
//! and the handles of the units or environments to work on.
//! Problems with the program being compiled are reported to
//! [`Context::log`]; the returned errors are reserved for
//! conditions that end the phase early.

pub use self::process::*;

use {
    crate::{
        context::Context,
        env::{EnvId, UnitId},
        error::Result,
        log::Log,
        tree::{ClassDecl, CompilationUnit, Name, SourceFile},
    },
};

mod process;

/// Turns source text into a compilation unit.
pub trait Parser
{
    /// Parse the text of `file`.
    ///
    /// Syntax errors are reported to `log`
    /// and the unit contains what could be recovered.
    fn parse(&mut self, log: &mut Log, file: &SourceFile, text: &str)
        -> CompilationUnit;
}

/// Decides which module each compilation unit belongs to.
pub trait ModuleResolver
{
    /// Add a module to the root modules of the run.
    fn add_extra_root_module(&mut self, module: Name);

    /// Assign modules to the given units.
    ///
    /// This must happen before the units are entered.
    fn init_modules(&mut self, cx: &mut Context, units: &[UnitId])
        -> Result<()>;
}

/// Enters the classes of compilation units into the symbol table.
pub trait Enter
{
    /// Enter the classes declared by `units`.
    ///
    /// This creates one environment per class declaration,
    /// including nested ones, and queues the environments
    /// of top-level classes on [`Context::todo`].
    fn enter(&mut self, cx: &mut Context, units: &[UnitId]) -> Result<()>;
}

/// Type checks class declarations.
pub trait Attribute
{
    /// Type check the class of `env`, rewriting its tree in place.
    fn attribute(&mut self, cx: &mut Context, env: EnvId) -> Result<()>;

    /// Finish attribution of a tree that had errors,
    /// so that later consumers see a fully attributed tree.
    fn post_attr(&mut self, _cx: &mut Context, _env: EnvId) -> Result<()>
    {
        Ok(())
    }
}

/// Checks dataflow properties such as reachability.
pub trait Flow
{
    /// Analyze the class of `env`.
    fn analyze(&mut self, cx: &mut Context, env: EnvId) -> Result<()>;
}

/// Passes that remove syntactic sugar ahead of code generation.
///
/// The driver runs the passes in the order they are declared here.
pub trait Lowering
{
    /// Erase generic types.
    fn trans_types(&mut self, cx: &mut Context, env: EnvId) -> Result<()>;

    /// Translate pattern matching.
    fn trans_patterns(&mut self, cx: &mut Context, env: EnvId)
        -> Result<()>;

    /// Turn lambda expressions and method references into methods.
    ///
    /// The driver skips this pass for classes without either.
    fn lambda_to_method(&mut self, cx: &mut Context, env: EnvId)
        -> Result<()>;

    /// Flatten nested classes into top-level class declarations.
    fn lower(&mut self, cx: &mut Context, env: EnvId)
        -> Result<Vec<ClassDecl>>;
}

/// Produces class file images.
pub trait Generate
{
    /// Generate the class file image for `class`,
    /// which was lowered from the class of `env`.
    ///
    /// Returns [`None`] if code generation failed,
    /// in which case the reason was reported to the log.
    fn gen_class(&mut self, cx: &mut Context, env: EnvId, class: &ClassDecl)
        -> Result<Option<Vec<u8>>>;
}
