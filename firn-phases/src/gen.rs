use {
    crate::Trace,
    firn_core::{
        context::Context,
        env::EnvId,
        error::Result,
        phase::Generate,
        tree::{ClassDecl, Node, Tree},
    },
};

/// First bytes of every class file image.
pub const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Generates class file images.
///
/// An image is the magic number followed by the printed class.
/// A class containing `toolarge;` cannot be generated.
pub struct Gen
{
    trace: Trace,
}

impl Gen
{
    /// Create a generator recording to `trace`.
    pub fn new(trace: Trace) -> Self
    {
        Self{trace}
    }
}

impl Generate for Gen
{
    fn gen_class(&mut self, cx: &mut Context, _env: EnvId, class: &ClassDecl)
        -> Result<Option<Vec<u8>>>
    {
        self.trace.record("generate", &class.name);

        let too_large = class.walk().any(|node| match node {
            Node::Member(Tree::Stmt(keyword)) => &**keyword == "toolarge",
            _ => false,
        });
        if too_large {
            cx.log.error("limit.code",
                         format!("code too large in {}", class.name));
            return Ok(None);
        }

        let mut image = MAGIC.to_vec();
        image.extend_from_slice(class.to_string().as_bytes());
        Ok(Some(image))
    }
}

#[cfg(test)]
mod tests
{
    use {
        super::*,
        crate::{parse_unit, testing::context, MemoryFileManager},
        firn_core::{env::Env, tree::{CompilationUnit, SourceFile}},
    };

    #[test]
    fn images()
    {
        let (mut cx, sink) = context(MemoryFileManager::default());
        let unit = cx.units.alloc(CompilationUnit::empty(SourceFile::new("A.java")));
        let (_, _, defs) = parse_unit("class A { } class B { toolarge; }").unwrap();
        let env = cx.envs.alloc(Env{
            tree: defs[0].clone(),
            toplevel: unit,
            enclosing: None,
        });

        let mut gen = Gen::new(Trace::default());
        let image = gen.gen_class(&mut cx, env, &defs[0]).unwrap().unwrap();
        assert_eq!(image[.. 4], MAGIC);
        assert_eq!(image[4 ..], b"class A {\n}\n"[..]);

        assert_eq!(gen.gen_class(&mut cx, env, &defs[1]).unwrap(), None);
        assert_eq!(sink.codes(), ["limit.code"]);
    }
}
