//! The simulation engine — drives one transition model over one graph.
//!
//! RULES:
//!   - One step = exactly one TransitionModel::step() call.
//!   - Steps are strictly sequential; step N+1 never starts before
//!     step N has consumed all of its draws.
//!   - Step N draws only from the Transition stream for tick N.
//!   - A failed step emits no snapshot and stops the run.
//!   - The engine reports termination; it never exits the process.

use crate::{
    clock::{RunPhase, SimClock},
    config::SimParams,
    error::SimResult,
    graph::{check_topology, ContactGraph},
    model::TransitionModel,
    observer::{ObserverSignal, SnapshotObserver},
    rng::{RngBank, StreamSlot},
    snapshot::{SimSnapshot, StepStats},
    state::StateStore,
    types::{RunId, Tick},
};

pub struct SimEngine<'g, M: TransitionModel> {
    pub run_id: RunId,
    pub clock:  SimClock,
    rng_bank:   RngBank,
    graph:      &'g dyn ContactGraph,
    model:      M,
    state:      M::State,
    last_stats: StepStats,
}

impl<'g, M: TransitionModel> SimEngine<'g, M> {
    /// Validate the parameters and topology, build the model from the
    /// same parameters, seed the initial infections, and return an
    /// engine ready for its first step.
    pub fn new(run_id: RunId, graph: &'g dyn ContactGraph, params: &SimParams) -> SimResult<Self> {
        params.validate()?;
        check_topology(graph)?;
        let model = M::from_params(params)?;

        let rng_bank = RngBank::new(params.seed);
        let n = graph.node_count();
        let mut seeding = rng_bank.for_stream(StreamSlot::Seeding);
        let infected = params.initial_infected.resolve(n, &mut seeding)?;
        let state = model.initial_state(n, &infected)?;

        log::info!(
            "run {run_id}: model={} nodes={n} seed={} initial_infected={} max_steps={}",
            model.name(),
            params.seed,
            infected.len(),
            params.max_steps
        );

        Ok(Self {
            clock: SimClock::new(params.max_steps),
            rng_bank,
            graph,
            model,
            state,
            last_stats: StepStats::default(),
            run_id,
        })
    }

    /// Continue a run from a snapshot it emitted earlier. The state is
    /// checked against the graph; the seed must be the original one for
    /// the continuation to match the uninterrupted run.
    pub fn resume(
        graph: &'g dyn ContactGraph,
        params: &SimParams,
        snapshot: SimSnapshot<M::State>,
    ) -> SimResult<Self> {
        params.validate()?;
        check_topology(graph)?;
        snapshot.state.check(graph.node_count())?;
        let model = M::from_params(params)?;

        log::info!(
            "run {}: resuming model={} at tick {}",
            snapshot.run_id,
            model.name(),
            snapshot.tick
        );

        Ok(Self {
            clock: SimClock::starting_at(snapshot.tick, params.max_steps),
            rng_bank: RngBank::new(params.seed),
            graph,
            model,
            state: snapshot.state,
            last_stats: snapshot.stats,
            run_id: snapshot.run_id,
        })
    }

    /// Advance one tick. This is the core simulation step.
    pub fn step(&mut self) -> SimResult<SimSnapshot<M::State>> {
        let tick = self.clock.peek_next()?;
        if self.clock.phase == RunPhase::Initialized {
            log::info!("run {}: started", self.run_id);
        }

        let mut rng = self.rng_bank.for_stream_at_tick(StreamSlot::Transition, tick);
        let stats = match self.model.step(self.graph, &mut self.state, &mut rng) {
            Ok(stats) => stats,
            Err(e) => {
                log::warn!("run {}: step {tick} failed: {e}", self.run_id);
                self.clock.stop();
                return Err(e);
            }
        };
        self.clock.advance()?;
        self.last_stats = stats;

        let snapshot = self.snapshot();
        log::debug!(
            "tick={tick} {}: S={} I={} R={} new={} draws={}",
            self.model.name(),
            snapshot.census.susceptible,
            snapshot.census.infected,
            snapshot.census.recovering,
            stats.new_infections(),
            stats.draws
        );
        if !self.clock.is_running() {
            log::info!("run {}: step budget reached at tick {tick}", self.run_id);
        }
        Ok(snapshot)
    }

    /// Step until stopped, handing every snapshot to `observer`.
    /// The observer is asked before each step whether it wants another
    /// frame. Returns the final tick.
    pub fn run<O>(&mut self, observer: &mut O) -> SimResult<Tick>
    where
        O: SnapshotObserver<M::State> + ?Sized,
    {
        while self.clock.is_running() {
            if !observer.wants_more() {
                log::info!("run {}: observer declined tick {}", self.run_id, self.clock.current_tick + 1);
                self.stop();
                break;
            }
            let snapshot = self.step()?;
            if observer.observe(&snapshot)? == ObserverSignal::Stop {
                log::info!("run {}: observer stopped the run at tick {}", self.run_id, snapshot.tick);
                self.stop();
            }
        }
        Ok(self.clock.current_tick)
    }

    /// Run up to `n` ticks, fewer if the budget runs out first.
    /// Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<Vec<SimSnapshot<M::State>>> {
        let mut snapshots = Vec::new();
        for _ in 0..n {
            if !self.clock.is_running() {
                break;
            }
            snapshots.push(self.step()?);
        }
        Ok(snapshots)
    }

    /// Cooperative cancellation; takes effect before the next step.
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn phase(&self) -> RunPhase {
        self.clock.phase
    }

    pub fn tick(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn state(&self) -> &M::State {
        &self.state
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Copy of the current state at the current tick.
    pub fn snapshot(&self) -> SimSnapshot<M::State> {
        SimSnapshot {
            run_id: self.run_id.clone(),
            tick:   self.clock.current_tick,
            census: self.state.census(),
            stats:  self.last_stats,
            state:  self.state.clone(),
        }
    }
}
