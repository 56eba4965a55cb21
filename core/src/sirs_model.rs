//! Continuous SIRS spread — infection decays back to full susceptibility.
//!
//! Per step:
//!   1. All recently_infected flags start false.
//!   2. Nodes are visited in a freshly shuffled order.
//!   3. A visited node infects itself with probability x; otherwise, if
//!      it was flagged in the previous step's result, it tries every
//!      out-neighbour w, succeeding with probability risk[w].
//!   4. The visited node's risk then climbs by the recovery rate,
//!      capped at 1.0.
//!
//! Risk and flags are double-buffered: the pass writes the spare
//! buffers and swaps them in only once the whole step succeeded.

use crate::{
    config::{check_probability, SimParams},
    error::{SimError, SimResult},
    graph::ContactGraph,
    model::TransitionModel,
    rng::SimRng,
    snapshot::StepStats,
    state::{ContinuousState, StateStore},
    types::NodeId,
};

pub struct SirsModel {
    spontaneous_infection: f64,
    recovery_rate:         f64,
    next_risk:             Vec<f64>,
    next_flags:            Vec<bool>,
}

impl SirsModel {
    pub fn new(params: &SimParams) -> SimResult<Self> {
        Self::with_rates(params.spontaneous_infection, params.recovery_rate)
    }

    pub fn with_rates(spontaneous_infection: f64, recovery_rate: f64) -> SimResult<Self> {
        check_probability("spontaneous_infection", spontaneous_infection)?;
        if !(recovery_rate > 0.0 && recovery_rate.is_finite()) {
            return Err(SimError::InvalidParameter {
                name:   "recovery_rate",
                value:  recovery_rate,
                reason: "must be positive so every node eventually recovers",
            });
        }
        Ok(Self {
            spontaneous_infection,
            recovery_rate,
            next_risk:  Vec::new(),
            next_flags: Vec::new(),
        })
    }

    pub fn recovery_rate(&self) -> f64 {
        self.recovery_rate
    }
}

impl TransitionModel for SirsModel {
    type State = ContinuousState;

    fn from_params(params: &SimParams) -> SimResult<Self> {
        Self::new(params)
    }

    fn name(&self) -> &'static str { "sirs" }

    fn initial_state(&self, node_count: usize, infected: &[NodeId]) -> SimResult<ContinuousState> {
        let mut state = ContinuousState::susceptible(node_count);
        for &node in infected {
            state.infect(node)?;
        }
        Ok(state)
    }

    fn step(
        &mut self,
        graph: &dyn ContactGraph,
        state: &mut ContinuousState,
        rng: &mut SimRng,
    ) -> SimResult<StepStats> {
        let n = graph.node_count();
        state.check(n)?;

        let mut stats = StepStats::default();
        self.next_risk.clone_from(&state.risk);
        self.next_flags.clear();
        self.next_flags.resize(n, false);

        let order = rng.shuffle((0..n).collect::<Vec<NodeId>>());
        for v in order {
            stats.draws += 1;
            if rng.chance(self.spontaneous_infection) {
                self.next_risk[v] = 0.0;
                self.next_flags[v] = true;
                stats.spontaneous_infections += 1;
            } else if state.recently_infected[v] {
                for &w in graph.neighbors(v) {
                    if w >= n {
                        return Err(SimError::unknown_node(w, n));
                    }
                    stats.draws += 1;
                    if rng.next_f64() < self.next_risk[w] {
                        self.next_flags[w] = true;
                        self.next_risk[w] = 0.0;
                        stats.transmissions += 1;
                    }
                }
            }

            if self.next_risk[v] < 1.0 {
                self.next_risk[v] = (self.next_risk[v] + self.recovery_rate).min(1.0);
            }
        }

        std::mem::swap(&mut state.risk, &mut self.next_risk);
        std::mem::swap(&mut state.recently_infected, &mut self.next_flags);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    #[test]
    fn zero_recovery_rate_rejected() {
        assert!(SirsModel::with_rates(0.0, 0.0).is_err());
        assert!(SirsModel::with_rates(0.0, -0.5).is_err());
        assert!(SirsModel::with_rates(2.0, 0.1).is_err());
    }

    #[test]
    fn seeded_node_infects_fully_susceptible_neighbour() {
        // risk[w] = 1.0 means every draw in [0, 1) infects.
        let graph = AdjacencyGraph::from_edges(2, [(0, 1)], false).unwrap();
        let mut model = SirsModel::with_rates(0.0, 0.25).unwrap();
        let mut state = model.initial_state(2, &[0]).unwrap();
        let stats = model.step(&graph, &mut state, &mut SimRng::new(11)).unwrap();

        assert_eq!(stats.transmissions, 1);
        assert!(state.recently_infected[1]);
        assert!(!state.recently_infected[0], "flags are rebuilt every step");
    }

    #[test]
    fn flags_from_this_step_do_not_spread_until_next() {
        // 0 -> 1 -> 2, directed. Only node 0 starts flagged.
        let graph = AdjacencyGraph::from_edges(3, [(0, 1), (1, 2)], true).unwrap();
        let mut model = SirsModel::with_rates(0.0, 0.1).unwrap();
        let mut state = model.initial_state(3, &[0]).unwrap();

        model.step(&graph, &mut state, &mut SimRng::new(4)).unwrap();
        assert!(state.recently_infected[1]);
        assert!(!state.recently_infected[2]);

        model.step(&graph, &mut state, &mut SimRng::new(5)).unwrap();
        assert!(state.recently_infected[2]);
    }

    #[test]
    fn risk_is_capped_at_one() {
        let graph = AdjacencyGraph::isolated(1, false);
        let mut model = SirsModel::with_rates(0.0, 0.3).unwrap();
        let mut state = ContinuousState::susceptible(1);
        state.risk[0] = 0.9;
        model.step(&graph, &mut state, &mut SimRng::new(1)).unwrap();
        assert_eq!(state.risk[0], 1.0);
    }
}
