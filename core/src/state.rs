//! Per-node epidemic state.
//!
//! RULE: A state store always holds exactly one entry per graph node.
//! Stores are only resized at construction; no node is ever removed
//! mid-run. Anything that breaks this is an InconsistentState error.

use crate::{
    error::{SimError, SimResult},
    snapshot::Census,
    types::NodeId,
};
use serde::{Deserialize, Serialize};

/// Behaviour shared by every state store variant.
pub trait StateStore: Clone + Serialize {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verify the store fits a graph of `node_count` nodes and holds
    /// only legal values.
    fn check(&self, node_count: usize) -> SimResult<()>;

    /// Compartment counts for observers and logs.
    fn census(&self) -> Census;
}

// ── Discrete (SI) ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compartment {
    Susceptible,
    Infected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteState {
    pub compartments: Vec<Compartment>,
}

impl DiscreteState {
    /// Everybody susceptible.
    pub fn susceptible(node_count: usize) -> Self {
        Self { compartments: vec![Compartment::Susceptible; node_count] }
    }

    pub fn get(&self, node: NodeId) -> SimResult<Compartment> {
        self.compartments
            .get(node)
            .copied()
            .ok_or_else(|| SimError::unknown_node(node, self.compartments.len()))
    }

    pub fn infect(&mut self, node: NodeId) -> SimResult<()> {
        let n = self.compartments.len();
        let slot = self
            .compartments
            .get_mut(node)
            .ok_or_else(|| SimError::unknown_node(node, n))?;
        *slot = Compartment::Infected;
        Ok(())
    }

    pub fn is_infected(&self, node: NodeId) -> bool {
        self.compartments.get(node) == Some(&Compartment::Infected)
    }

    pub fn infected_count(&self) -> usize {
        self.compartments
            .iter()
            .filter(|&&c| c == Compartment::Infected)
            .count()
    }
}

impl StateStore for DiscreteState {
    fn len(&self) -> usize {
        self.compartments.len()
    }

    fn check(&self, node_count: usize) -> SimResult<()> {
        if self.compartments.len() != node_count {
            return Err(SimError::size_mismatch(
                "discrete state",
                self.compartments.len(),
                node_count,
            ));
        }
        Ok(())
    }

    fn census(&self) -> Census {
        let infected = self.infected_count();
        Census {
            susceptible: self.compartments.len() - infected,
            infected,
            recovering: 0,
        }
    }
}

// ── Continuous (SIRS) ────────────────────────────────────────────────────────

/// `risk[v]` is the distance from full infection: 0.0 just infected,
/// 1.0 fully susceptible. `recently_infected[v]` marks nodes infected
/// during the step that produced this state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousState {
    pub risk:              Vec<f64>,
    pub recently_infected: Vec<bool>,
}

impl ContinuousState {
    /// Everybody fully susceptible, nobody flagged.
    pub fn susceptible(node_count: usize) -> Self {
        Self {
            risk:              vec![1.0; node_count],
            recently_infected: vec![false; node_count],
        }
    }

    pub fn risk(&self, node: NodeId) -> SimResult<f64> {
        self.risk
            .get(node)
            .copied()
            .ok_or_else(|| SimError::unknown_node(node, self.risk.len()))
    }

    /// Mark `node` as freshly infected.
    pub fn infect(&mut self, node: NodeId) -> SimResult<()> {
        let n = self.risk.len();
        match (self.risk.get_mut(node), self.recently_infected.get_mut(node)) {
            (Some(risk), Some(flag)) => {
                *risk = 0.0;
                *flag = true;
                Ok(())
            }
            _ => Err(SimError::unknown_node(node, n)),
        }
    }
}

impl StateStore for ContinuousState {
    fn len(&self) -> usize {
        self.risk.len()
    }

    fn check(&self, node_count: usize) -> SimResult<()> {
        if self.risk.len() != node_count {
            return Err(SimError::size_mismatch("risk map", self.risk.len(), node_count));
        }
        if self.recently_infected.len() != node_count {
            return Err(SimError::size_mismatch(
                "recently_infected map",
                self.recently_infected.len(),
                node_count,
            ));
        }
        if let Some((node, value)) = self
            .risk
            .iter()
            .enumerate()
            .find(|(_, r)| !(0.0..=1.0).contains(*r))
        {
            return Err(SimError::InconsistentState {
                detail: format!("risk of node {node} is {value}, outside [0, 1]"),
            });
        }
        Ok(())
    }

    /// Flagged nodes count as infected, nodes at full risk as
    /// susceptible, everything in between as recovering.
    fn census(&self) -> Census {
        let mut census = Census::default();
        for (risk, &flag) in self.risk.iter().zip(&self.recently_infected) {
            if flag {
                census.infected += 1;
            } else if *risk >= 1.0 {
                census.susceptible += 1;
            } else {
                census.recovering += 1;
            }
        }
        census
    }
}
