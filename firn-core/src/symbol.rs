//! Symbol table of classes and packages known to a compile run.

use {
    crate::{env::{EnvId, UnitId}, tree::Name},
    std::collections::{HashMap, HashSet},
    thiserror::Error,
};

/// A class known to the compiler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassSymbol
{
    /// Flat name of the class, e.g. `Outer$Inner` for nested classes.
    pub name: Name,

    /// Flat name of the superclass, if any.
    pub superclass: Option<Name>,

    /// Flat name of the enclosing class, for nested classes.
    pub enclosing: Option<Name>,

    /// The compilation unit declaring the class,
    /// or [`None`] for classes loaded from class files.
    pub unit: Option<UnitId>,
}

/// Returned when a class is entered twice.
#[derive(Debug, Error)]
#[error("Duplicate class `{0}`")]
pub struct DuplicateClass(pub Name);

/// Classes and packages known to a compile run.
#[derive(Debug, Default)]
pub struct Symtab
{
    classes: HashMap<Name, ClassSymbol>,
    envs: HashMap<Name, EnvId>,
    packages: HashSet<Name>,
}

impl Symtab
{
    /// Enter a class.
    ///
    /// A class may be entered again by the compilation unit
    /// that entered it before, which replaces the symbol.
    /// This happens when a later processing round re-enters its trees.
    pub fn enter_class(&mut self, symbol: ClassSymbol)
        -> Result<(), DuplicateClass>
    {
        match self.classes.get(&symbol.name) {
            Some(old) if old.unit != symbol.unit =>
                Err(DuplicateClass(symbol.name)),
            _ => {
                self.classes.insert(symbol.name.clone(), symbol);
                Ok(())
            },
        }
    }

    /// Look up a class by its flat name.
    pub fn lookup(&self, name: &str) -> Option<&ClassSymbol>
    {
        self.classes.get(name)
    }

    /// The superclass of a class, if both are known.
    pub fn superclass(&self, name: &str) -> Option<&ClassSymbol>
    {
        let superclass = self.lookup(name)?.superclass.as_deref()?;
        self.lookup(superclass)
    }

    /// The outermost class enclosing a class, or the class itself.
    pub fn outermost_class<'a>(&'a self, mut symbol: &'a ClassSymbol)
        -> &'a ClassSymbol
    {
        while let Some(outer) = symbol.enclosing.as_deref()
            .and_then(|name| self.lookup(name))
        {
            symbol = outer;
        }
        symbol
    }

    /// Associate a class with the environment it is compiled in.
    pub fn set_env(&mut self, name: Name, env: EnvId)
    {
        self.envs.insert(name, env);
    }

    /// The environment a class is compiled in,
    /// or [`None`] if the class is not compiled in this run.
    pub fn env(&self, name: &str) -> Option<EnvId>
    {
        self.envs.get(name).copied()
    }

    /// Enter a package.
    pub fn enter_package(&mut self, name: Name)
    {
        self.packages.insert(name);
    }

    /// Whether a package is known.
    pub fn lookup_package(&self, name: &str) -> bool
    {
        self.packages.contains(name)
    }

    /// All known classes, in no particular order.
    pub fn classes(&self) -> impl Iterator<Item=&ClassSymbol>
    {
        self.classes.values()
    }
}
