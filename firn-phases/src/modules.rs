use {
    firn_core::{
        context::Context,
        env::UnitId,
        error::Result,
        phase::ModuleResolver,
        tree::Name,
    },
    std::collections::HashSet,
};

/// Name of the module owning units without a module directive.
pub const UNNAMED_MODULE: &str = "unnamed";

/// Assigns units to the module they declare, or to the unnamed module.
#[derive(Debug, Default)]
pub struct Modules
{
    declared: HashSet<Name>,
    extra_roots: Vec<Name>,
    reported: HashSet<Name>,
}

impl Modules
{
    /// The extra root modules added so far.
    pub fn extra_roots(&self) -> &[Name]
    {
        &self.extra_roots
    }
}

impl ModuleResolver for Modules
{
    fn add_extra_root_module(&mut self, module: Name)
    {
        if !self.extra_roots.contains(&module) {
            self.extra_roots.push(module);
        }
    }

    fn init_modules(&mut self, cx: &mut Context, units: &[UnitId])
        -> Result<()>
    {
        for &unit in units {
            let unit = &cx.units[unit];
            let module = match unit.module() {
                Some(module) => module.clone(),
                None => {
                    let module: Name = UNNAMED_MODULE.into();
                    unit.set_module(module.clone()).ok();
                    module
                },
            };
            self.declared.insert(module);
        }

        for root in &self.extra_roots {
            if !self.declared.contains(root) && self.reported.insert(root.clone()) {
                cx.log.error("module.not.found",
                             format!("module not found: {root}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use {
        super::*,
        crate::{testing::context, MemoryFileManager},
        firn_core::tree::{CompilationUnit, SourceFile},
    };

    #[test]
    fn default_and_extra_roots()
    {
        let (mut cx, sink) = context(MemoryFileManager::default());
        let a = cx.units.alloc(CompilationUnit::empty(SourceFile::new("A.java")));
        let b = cx.units.alloc(CompilationUnit::empty(SourceFile::new("B.java")));
        cx.units[b].set_module("m".into()).unwrap();

        let mut modules = Modules::default();
        modules.add_extra_root_module("m".into());
        modules.add_extra_root_module("m".into());
        modules.add_extra_root_module("missing".into());
        modules.init_modules(&mut cx, &[a, b]).unwrap();
        modules.init_modules(&mut cx, &[]).unwrap();

        assert_eq!(cx.units[a].module().map(|m| &**m), Some(UNNAMED_MODULE));
        assert_eq!(cx.units[b].module().map(|m| &**m), Some("m"));
        assert_eq!(modules.extra_roots().len(), 2);
        assert_eq!(sink.codes(), ["module.not.found"]);
    }
}
