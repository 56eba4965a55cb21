//! Discrete SI spread — infection is permanent.
//!
//! Each step, every node that was Infected when the step began tries
//! each still-Susceptible neighbour once, in node index order. A node
//! infected during the step only starts transmitting on the next one:
//! the pass reads the settled compartments and writes a second buffer.

use crate::{
    config::{check_probability, SimParams},
    error::{SimError, SimResult},
    graph::ContactGraph,
    model::TransitionModel,
    rng::SimRng,
    snapshot::StepStats,
    state::{Compartment, DiscreteState, StateStore},
    types::NodeId,
};

pub struct SiModel {
    transmission_probability: f64,
    next: Vec<Compartment>,
}

impl SiModel {
    pub fn new(params: &SimParams) -> SimResult<Self> {
        Self::with_probability(params.transmission_probability)
    }

    pub fn with_probability(transmission_probability: f64) -> SimResult<Self> {
        check_probability("transmission_probability", transmission_probability)?;
        Ok(Self {
            transmission_probability,
            next: Vec::new(),
        })
    }

    pub fn transmission_probability(&self) -> f64 {
        self.transmission_probability
    }
}

impl TransitionModel for SiModel {
    type State = DiscreteState;

    fn from_params(params: &SimParams) -> SimResult<Self> {
        Self::new(params)
    }

    fn name(&self) -> &'static str { "si" }

    fn initial_state(&self, node_count: usize, infected: &[NodeId]) -> SimResult<DiscreteState> {
        let mut state = DiscreteState::susceptible(node_count);
        for &node in infected {
            state.infect(node)?;
        }
        Ok(state)
    }

    fn step(
        &mut self,
        graph: &dyn ContactGraph,
        state: &mut DiscreteState,
        rng: &mut SimRng,
    ) -> SimResult<StepStats> {
        let n = graph.node_count();
        state.check(n)?;

        let mut stats = StepStats::default();
        self.next.clone_from(&state.compartments);

        let infectors = state
            .compartments
            .iter()
            .enumerate()
            .filter(|&(_, c)| *c == Compartment::Infected)
            .map(|(v, _)| v);

        for v in infectors {
            for &w in graph.neighbors(v) {
                let slot = self
                    .next
                    .get_mut(w)
                    .ok_or_else(|| SimError::unknown_node(w, n))?;
                if *slot != Compartment::Susceptible {
                    continue;
                }
                stats.draws += 1;
                if rng.next_f64() <= self.transmission_probability {
                    *slot = Compartment::Infected;
                    stats.transmissions += 1;
                }
            }
        }

        std::mem::swap(&mut state.compartments, &mut self.next);
        Ok(stats)
    }
}
