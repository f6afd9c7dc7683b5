use {
    crate::{flat_name, Trace},
    firn_core::{
        context::Context,
        env::EnvId,
        error::Result,
        phase::Flow,
        tree::{Node, Tree},
    },
};

/// Reports `unreachable;` statements.
pub struct FlowAnalysis
{
    trace: Trace,
}

impl FlowAnalysis
{
    /// Create flow analysis recording to `trace`.
    pub fn new(trace: Trace) -> Self
    {
        Self{trace}
    }
}

impl Flow for FlowAnalysis
{
    fn analyze(&mut self, cx: &mut Context, env: EnvId) -> Result<()>
    {
        let name = flat_name(cx, env);
        self.trace.record("flow", &name);
        let unreachable =
            cx.envs[env].tree.walk()
            .filter(|node| match node {
                Node::Member(Tree::Stmt(keyword)) => &**keyword == "unreachable",
                _ => false,
            })
            .count();
        for _ in 0 .. unreachable {
            cx.log.error("unreachable.stmt", "unreachable statement");
        }
        Ok(())
    }
}
