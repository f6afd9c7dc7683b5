//! Environments, the units of work of the driver.
//!
//! Environments and compilation units live in arenas
//! and are referred to by copyable handles.
//! Per-environment progress and caches are kept in side tables
//! keyed by these handles, rather than in the environments themselves.

use {
    crate::tree::{ClassDecl, CompilationUnit, SourceFile},
    std::{
        collections::{HashMap, HashSet, VecDeque},
        fmt,
        ops::{Index, IndexMut},
    },
};

/// Identifies an environment for the lifetime of a compile invocation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EnvId(u32);

/// Identifies a compilation unit for the lifetime of a compile invocation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UnitId(u32);

impl fmt::Display for EnvId
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "env#{}", self.0)
    }
}

/// Attribution context of one class declaration.
#[derive(Debug)]
pub struct Env
{
    /// The class declaration.
    ///
    /// Phases rewrite this tree in place.
    pub tree: ClassDecl,

    /// The compilation unit the class was declared in.
    pub toplevel: UnitId,

    /// The environment of the enclosing class, for nested classes.
    pub enclosing: Option<EnvId>,
}

/* -------------------------------------------------------------------------- */
/*                                   Arenas                                   */
/* -------------------------------------------------------------------------- */

/// Arena of environments.
#[derive(Debug, Default)]
pub struct Envs
{
    envs: Vec<Env>,
}

impl Envs
{
    /// Move an environment into the arena.
    pub fn alloc(&mut self, env: Env) -> EnvId
    {
        let id = u32::try_from(self.envs.len())
            .expect("Too many environments");
        self.envs.push(env);
        EnvId(id)
    }

    /// The number of environments ever allocated.
    pub fn len(&self) -> usize
    {
        self.envs.len()
    }

    /// Whether no environment was allocated yet.
    pub fn is_empty(&self) -> bool
    {
        self.envs.is_empty()
    }
}

impl Index<EnvId> for Envs
{
    type Output = Env;

    fn index(&self, id: EnvId) -> &Env
    {
        &self.envs[id.0 as usize]
    }
}

impl IndexMut<EnvId> for Envs
{
    fn index_mut(&mut self, id: EnvId) -> &mut Env
    {
        &mut self.envs[id.0 as usize]
    }
}

/// Arena of compilation units.
#[derive(Debug, Default)]
pub struct Units
{
    units: Vec<CompilationUnit>,
}

impl Units
{
    /// Move a compilation unit into the arena.
    pub fn alloc(&mut self, unit: CompilationUnit) -> UnitId
    {
        let id = u32::try_from(self.units.len())
            .expect("Too many compilation units");
        self.units.push(unit);
        UnitId(id)
    }
}

impl Index<UnitId> for Units
{
    type Output = CompilationUnit;

    fn index(&self, id: UnitId) -> &CompilationUnit
    {
        &self.units[id.0 as usize]
    }
}

/* -------------------------------------------------------------------------- */
/*                                    Todo                                    */
/* -------------------------------------------------------------------------- */

/// Environments awaiting attribution, in the order they were entered.
#[derive(Debug, Default)]
pub struct Todo
{
    queue: VecDeque<EnvId>,
}

impl Todo
{
    /// Add an environment to the end of the queue.
    pub fn append(&mut self, env: EnvId)
    {
        self.queue.push_back(env);
    }

    /// Remove the environment at the front of the queue.
    pub fn remove(&mut self) -> Option<EnvId>
    {
        self.queue.pop_front()
    }

    /// Remove all environments, in queue order.
    pub fn take_all(&mut self) -> Vec<EnvId>
    {
        self.queue.drain(..).collect()
    }

    /// Remove all environments, grouped by the unit they came from.
    ///
    /// Groups are ordered by the first appearance of their unit
    /// and each group keeps the queue order of its environments.
    pub fn take_grouped_by_file(&mut self, envs: &Envs)
        -> VecDeque<Vec<EnvId>>
    {
        let mut groups: VecDeque<Vec<EnvId>> = VecDeque::new();
        let mut index = HashMap::new();
        for env in self.queue.drain(..) {
            let unit = envs[env].toplevel;
            let i = *index.entry(unit).or_insert_with(|| {
                groups.push_back(Vec::new());
                groups.len() - 1
            });
            groups[i].push(env);
        }
        groups
    }

    /// Keep only environments whose unit was read from one of `files`.
    pub fn retain_files(
        &mut self,
        envs: &Envs,
        units: &Units,
        files: &HashSet<SourceFile>,
    )
    {
        self.queue.retain(|&env| {
            let unit = envs[env].toplevel;
            files.contains(units[unit].source())
        });
    }

    /// The queued environments, front first.
    pub fn iter(&self) -> impl Iterator<Item=EnvId> + '_
    {
        self.queue.iter().copied()
    }

    /// The number of queued environments.
    pub fn len(&self) -> usize
    {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool
    {
        self.queue.is_empty()
    }

    /// Remove all environments.
    pub fn clear(&mut self)
    {
        self.queue.clear();
    }
}
