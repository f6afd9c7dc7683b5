//! Tracking how far each environment has progressed.

use {
    crate::env::EnvId,
    serde::{Deserialize, Serialize},
    std::{collections::HashMap, fmt, str::FromStr},
    thiserror::Error,
};

/// Checkpoint in the pipeline, in pipeline order.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompileState
{
    Init,
    Parse,
    Enter,
    Process,
    Attr,
    Flow,
    TransTypes,
    TransPatterns,
    Unlambda,
    Lower,
    Generate,
}

impl CompileState
{
    /// All states, in pipeline order.
    pub const ALL: [Self; 11] = [
        Self::Init, Self::Parse, Self::Enter, Self::Process,
        Self::Attr, Self::Flow, Self::TransTypes, Self::TransPatterns,
        Self::Unlambda, Self::Lower, Self::Generate,
    ];

    /// Whether this state comes strictly after `other`.
    pub fn is_after(self, other: Self) -> bool
    {
        self > other
    }

    /// The conventional upper-case spelling.
    pub fn as_str(self) -> &'static str
    {
        match self {
            Self::Init          => "INIT",
            Self::Parse         => "PARSE",
            Self::Enter         => "ENTER",
            Self::Process       => "PROCESS",
            Self::Attr          => "ATTR",
            Self::Flow          => "FLOW",
            Self::TransTypes    => "TRANSTYPES",
            Self::TransPatterns => "TRANSPATTERNS",
            Self::Unlambda      => "UNLAMBDA",
            Self::Lower         => "LOWER",
            Self::Generate      => "GENERATE",
        }
    }
}

impl fmt::Display for CompileState
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown compile state.
#[derive(Debug, Error)]
#[error("Unknown compile state `{0}`")]
pub struct UnknownCompileState(pub String);

impl FromStr for CompileState
{
    type Err = UnknownCompileState;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        Self::ALL.into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCompileState(s.to_owned()))
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Ledger                                   */
/* -------------------------------------------------------------------------- */

/// The furthest state each environment has reached.
///
/// Phases consult [`is_done`][`Self::is_done`] before doing work
/// and call [`put`][`Self::put`] right after completing it,
/// so that no phase completes twice for the same environment.
#[derive(Debug, Default)]
pub struct CompileStates
{
    states: HashMap<EnvId, CompileState>,
}

impl CompileStates
{
    /// Whether `env` has reached `state` or a later state.
    pub fn is_done(&self, env: EnvId, state: CompileState) -> bool
    {
        self.states.get(&env).map_or(false, |&reached| reached >= state)
    }

    /// Record that `env` has reached `state`.
    ///
    /// The recorded state never decreases.
    /// Recording an earlier state than the one recorded is ignored.
    pub fn put(&mut self, env: EnvId, state: CompileState)
    {
        let reached = self.states.entry(env).or_insert(state);
        if state > *reached {
            *reached = state;
        } else if state < *reached {
            tracing::trace!(%env, %state, reached = %*reached,
                            "ignoring earlier compile state");
        }
    }

    /// The furthest state `env` has reached, if any was recorded.
    pub fn get(&self, env: EnvId) -> Option<CompileState>
    {
        self.states.get(&env).copied()
    }
}
