//! Simulation clock — owns the tick counter, step budget, and run phase.

use crate::{
    error::{SimError, SimResult},
    types::Tick,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Initialized, // built, no step taken yet
    Running,     // at least one step taken, budget left
    Stopped,     // budget spent, stopped by the caller, or a step failed
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub current_tick: Tick,
    pub max_steps:    Tick,
    pub phase:        RunPhase,
}

impl SimClock {
    pub fn new(max_steps: Tick) -> Self {
        Self::starting_at(0, max_steps)
    }

    /// A clock resuming at `tick`. Already stopped if the budget is spent.
    pub fn starting_at(tick: Tick, max_steps: Tick) -> Self {
        let phase = if tick >= max_steps {
            RunPhase::Stopped
        } else {
            RunPhase::Initialized
        };
        Self { current_tick: tick, max_steps, phase }
    }

    /// The tick the next step would produce. Fails once stopped.
    pub fn peek_next(&self) -> SimResult<Tick> {
        if !self.is_running() {
            return Err(SimError::RunStopped { tick: self.current_tick });
        }
        Ok(self.current_tick + 1)
    }

    /// Commit one completed step. Returns the new tick number.
    pub fn advance(&mut self) -> SimResult<Tick> {
        let tick = self.peek_next()?;
        self.current_tick = tick;
        self.phase = if tick >= self.max_steps {
            RunPhase::Stopped
        } else {
            RunPhase::Running
        };
        Ok(tick)
    }

    pub fn stop(&mut self) {
        self.phase = RunPhase::Stopped;
    }

    pub fn is_running(&self) -> bool {
        self.phase != RunPhase::Stopped
    }

    pub fn remaining(&self) -> Tick {
        self.max_steps.saturating_sub(self.current_tick)
    }
}
