//! Syntax trees as seen by the driver.
//!
//! The driver only looks inside trees for class declarations,
//! lambda expressions and method references.
//! All other members are carried through opaquely
//! and interpreted by the phase implementations.

use std::{
    cell::OnceCell,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Name of a class, member or module.
pub type Name = Arc<str>;

/// Identifies a source file.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourceFile
{
    path: Arc<Path>,
}

impl SourceFile
{
    /// Create a source file identity from a pathname.
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self{path: Arc::from(path.into())}
    }

    /// The pathname of the source file.
    pub fn path(&self) -> &Path
    {
        &self.path
    }
}

impl fmt::Display for SourceFile
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "{}", self.path.display())
    }
}

/* -------------------------------------------------------------------------- */
/*                              Compilation units                             */
/* -------------------------------------------------------------------------- */

/// Syntax tree for one source file.
#[derive(Debug)]
pub struct CompilationUnit
{
    source: SourceFile,

    // INVARIANT: Set at most once, by the parser or the module resolver.
    module: OnceCell<Name>,

    /// The package the unit declares, if any.
    pub package: Option<Name>,

    /// Top-level class declarations, in source order.
    pub defs: Vec<ClassDecl>,
}

impl CompilationUnit
{
    /// Create a compilation unit.
    pub fn new(source: SourceFile, defs: Vec<ClassDecl>) -> Self
    {
        Self{source, module: OnceCell::new(), package: None, defs}
    }

    /// Compilation unit for a file that could not be read.
    pub fn empty(source: SourceFile) -> Self
    {
        Self::new(source, Vec::new())
    }

    /// The file this unit was parsed from.
    pub fn source(&self) -> &SourceFile
    {
        &self.source
    }

    /// The module owning this unit, if decided yet.
    pub fn module(&self) -> Option<&Name>
    {
        self.module.get()
    }

    /// Decide the module owning this unit.
    ///
    /// The owning module can be set only once.
    /// If it was already set, the rejected name is returned.
    pub fn set_module(&self, module: Name) -> Result<(), Name>
    {
        self.module.set(module)
    }
}

/* -------------------------------------------------------------------------- */
/*                                    Trees                                   */
/* -------------------------------------------------------------------------- */

/// Class declaration, top-level or nested.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassDecl
{
    /// The name of the class.
    ///
    /// Top-level classes use their simple name.
    /// Classes hoisted out of their enclosing class by lowering
    /// use the flat `Outer$Inner` form.
    pub name: Name,

    /// The superclass as written in the declaration.
    pub extends: Option<Name>,

    /// Members in source order.
    pub members: Vec<Tree>,
}

/// Member or statement inside a class declaration.
#[allow(missing_docs)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Tree
{
    /// Nested class declaration.
    Class(ClassDecl),

    Field{name: Name},

    Method{name: Name, body: Vec<Tree>},

    Lambda{body: Vec<Tree>},

    MethodRef{qualifier: Name, member: Name},

    /// Use of a class name.
    Ident(Name),

    /// Statement that the driver does not interpret.
    Stmt(Name),
}

/// Node visited by [`ClassDecl::walk`].
#[derive(Clone, Copy, Debug)]
pub enum Node<'a>
{
    /// A class declaration, including the one the walk started at.
    Class(&'a ClassDecl),

    /// Any other tree.
    Member(&'a Tree),
}

impl ClassDecl
{
    /// Visit this declaration and every tree nested in it, in pre-order.
    ///
    /// The walk uses an explicit stack, so deeply nested
    /// declarations do not grow the call stack.
    pub fn walk(&self) -> Walk<'_>
    {
        Walk{stack: vec![Node::Class(self)]}
    }

    /// Whether any lambda or method reference occurs in this declaration.
    pub fn has_lambdas(&self) -> bool
    {
        self.walk().any(|node| matches!(
            node,
            Node::Member(Tree::Lambda{..} | Tree::MethodRef{..}),
        ))
    }
}

/// Iterator returned by [`ClassDecl::walk`].
pub struct Walk<'a>
{
    stack: Vec<Node<'a>>,
}

impl<'a> Iterator for Walk<'a>
{
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item>
    {
        let node = self.stack.pop()?;
        let children: &[Tree] = match node {
            Node::Class(decl) => &decl.members,
            Node::Member(Tree::Method{body, ..}) => body,
            Node::Member(Tree::Lambda{body}) => body,
            Node::Member(_) => &[],
        };
        // Reversed so that children are visited in source order.
        self.stack.extend(children.iter().rev().map(|tree| match tree {
            Tree::Class(decl) => Node::Class(decl),
            other => Node::Member(other),
        }));
        Some(node)
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Printing                                 */
/* -------------------------------------------------------------------------- */

// Printed trees use the same concrete syntax the reference parser reads,
// so emitted source can be compiled again.

impl fmt::Display for ClassDecl
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        print_class(f, self, 0)
    }
}

fn print_class(f: &mut fmt::Formatter, decl: &ClassDecl, indent: usize)
    -> fmt::Result
{
    write!(f, "{:indent$}class {}", "", decl.name, indent = indent)?;
    if let Some(extends) = &decl.extends {
        write!(f, " extends {}", extends)?;
    }
    writeln!(f, " {{")?;
    print_trees(f, &decl.members, indent + 4)?;
    writeln!(f, "{:indent$}}}", "", indent = indent)
}

fn print_trees(f: &mut fmt::Formatter, trees: &[Tree], indent: usize)
    -> fmt::Result
{
    for tree in trees {
        match tree {
            Tree::Class(decl) =>
                print_class(f, decl, indent)?,
            Tree::Field{name} =>
                writeln!(f, "{:indent$}field {};", "", name)?,
            Tree::Method{name, body} => {
                writeln!(f, "{:indent$}method {} {{", "", name)?;
                print_trees(f, body, indent + 4)?;
                writeln!(f, "{:indent$}}}", "")?;
            },
            Tree::Lambda{body} => {
                writeln!(f, "{:indent$}lambda {{", "")?;
                print_trees(f, body, indent + 4)?;
                writeln!(f, "{:indent$}}}", "")?;
            },
            Tree::MethodRef{qualifier, member} =>
                writeln!(f, "{:indent$}ref {}::{};", "", qualifier, member)?,
            Tree::Ident(name) =>
                writeln!(f, "{:indent$}use {};", "", name)?,
            Tree::Stmt(keyword) =>
                writeln!(f, "{:indent$}{};", "", keyword)?,
        }
    }
    Ok(())
}
