//! Transition model trait.
//!
//! RULE: Every propagation policy implements TransitionModel.
//! The engine calls step() exactly once per tick, handing it the
//! tick's own RNG stream. A model never keeps a reference to the
//! graph or the state between calls.

use crate::{
    config::SimParams,
    error::SimResult,
    graph::ContactGraph,
    rng::SimRng,
    snapshot::StepStats,
    state::StateStore,
    types::NodeId,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The contract every transition policy must fulfill.
pub trait TransitionModel {
    type State: StateStore;

    /// Build the policy from the run's parameters. The engine calls
    /// this itself so the model and the recorded parameters always agree.
    fn from_params(params: &SimParams) -> SimResult<Self>
    where
        Self: Sized;

    /// Unique stable name for this policy.
    fn name(&self) -> &'static str;

    /// Fresh state for `node_count` nodes with `infected` already
    /// infected. `infected` is validated against `node_count` by the caller.
    fn initial_state(&self, node_count: usize, infected: &[NodeId]) -> SimResult<Self::State>;

    /// Compute the next step in place.
    ///
    /// - `graph`: the run's topology
    /// - `state`: last step's settled state; replaced by this step's result
    /// - `rng`:   this tick's deterministic stream
    ///
    /// On error `state` is left exactly as it was.
    fn step(
        &mut self,
        graph: &dyn ContactGraph,
        state: &mut Self::State,
        rng: &mut SimRng,
    ) -> SimResult<StepStats>;
}

/// Which policy a runner should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Si,
    Sirs,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Si   => "si",
            Self::Sirs => "sirs",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "si"   => Ok(Self::Si),
            "sirs" => Ok(Self::Sirs),
            other  => Err(anyhow::anyhow!("unknown model '{other}' (expected si or sirs)")),
        }
    }
}
