//! Snapshot serialization — one per-step copy of the state store.
//!
//! A snapshot is emitted after every step. It captures the complete
//! state needed to resume simulation from that tick via
//! `SimEngine::resume` without replaying from tick 0.

use crate::{
    error::SimResult,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

/// Compartment counts at one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub susceptible: usize,
    pub infected:    usize,
    pub recovering:  usize,
}

/// What one transition step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub spontaneous_infections: usize,
    pub transmissions:          usize,
    pub draws:                  u64,
}

impl StepStats {
    pub fn new_infections(&self) -> usize {
        self.spontaneous_infections + self.transmissions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot<S> {
    pub run_id: RunId,
    pub tick:   Tick,
    pub census: Census,
    pub stats:  StepStats,
    pub state:  S,
}

impl<S: Serialize> SimSnapshot<S> {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
