//! Continuous SIRS spread: bounds, recovery progress, isolated nodes.

use contagion_core::{
    config::{SeedSet, SimParams},
    engine::SimEngine,
    graph::AdjacencyGraph,
    sirs_model::SirsModel,
};

fn sirs_params(x: f64, recovery_rate: f64, seed: u64, steps: u64) -> SimParams {
    SimParams {
        spontaneous_infection:    x,
        transmission_probability: 0.0,
        recovery_rate,
        max_steps:                steps,
        initial_infected:         SeedSet::Nodes(Vec::new()),
        seed,
    }
}

fn engine_for<'g>(graph: &'g AdjacencyGraph, params: &SimParams) -> SimEngine<'g, SirsModel> {
    SimEngine::<SirsModel>::new("sirs-test".into(), graph, params).unwrap()
}

#[test]
fn isolated_node_without_spontaneous_infection_never_changes() {
    let graph = AdjacencyGraph::isolated(1, false);
    for seed in [0, 1, 42, u64::MAX] {
        let params = sirs_params(0.0, 0.01, seed, 300);
        let mut engine = engine_for(&graph, &params);
        for snapshot in engine.run_ticks(300).unwrap() {
            assert_eq!(snapshot.state.risk[0], 1.0);
            assert!(!snapshot.state.recently_infected[0]);
        }
    }
}

#[test]
fn forced_reinfection_settles_at_the_recovery_increment() {
    let graph = AdjacencyGraph::isolated(1, false);
    let params = sirs_params(1.0, 0.01, 3, 100);
    let mut engine = engine_for(&graph, &params);

    for snapshot in engine.run_ticks(100).unwrap() {
        assert_eq!(snapshot.state.risk[0], 0.01, "tick {}", snapshot.tick);
        assert!(snapshot.state.recently_infected[0]);
        assert_eq!(snapshot.stats.spontaneous_infections, 1);
    }
}

#[test]
fn risk_stays_in_unit_interval() {
    let n = 200;
    let edges = (0..n).flat_map(|i| [(i, (i + 1) % n), (i, (i * 7 + 3) % n)]);
    let graph = AdjacencyGraph::from_edges(n, edges, false).unwrap();
    let mut params = sirs_params(0.01, 0.07, 11, 400);
    params.initial_infected = SeedSet::Fraction(0.05);
    let mut engine = engine_for(&graph, &params);

    for snapshot in engine.run_ticks(400).unwrap() {
        for (node, &risk) in snapshot.state.risk.iter().enumerate() {
            assert!(
                (0.0..=1.0).contains(&risk),
                "risk of node {node} is {risk} at tick {}",
                snapshot.tick
            );
        }
    }
}

#[test]
fn unreinfected_nodes_recover_by_exactly_the_increment() {
    let n = 60;
    let edges = (0..n).map(|i| (i, (i + 1) % n));
    let graph = AdjacencyGraph::from_edges(n, edges, false).unwrap();
    let rate = 0.125; // exact in binary, so repeated sums stay exact
    let mut params = sirs_params(0.02, rate, 5, 150);
    params.initial_infected = SeedSet::Nodes(vec![0, 30]);
    let mut engine = engine_for(&graph, &params);

    let mut previous = engine.state().clone();
    for snapshot in engine.run_ticks(150).unwrap() {
        for node in 0..n {
            if snapshot.state.recently_infected[node] {
                continue;
            }
            let before = previous.risk[node];
            let after = snapshot.state.risk[node];
            let expected = (before + rate).min(1.0);
            assert_eq!(after, expected, "node {node} at tick {}", snapshot.tick);
        }
        previous = snapshot.state;
    }
}

#[test]
fn newly_infected_nodes_are_flagged_with_low_risk() {
    let graph = AdjacencyGraph::from_edges(4, [(0, 1), (1, 2), (2, 3)], false).unwrap();
    let mut params = sirs_params(0.0, 0.1, 8, 20);
    params.initial_infected = SeedSet::Nodes(vec![0]);
    let mut engine = engine_for(&graph, &params);

    for snapshot in engine.run_ticks(20).unwrap() {
        for node in 0..4 {
            if snapshot.state.recently_infected[node] {
                // Visited after infection: +0.1; infected after its visit: 0.0.
                let risk = snapshot.state.risk[node];
                assert!(risk == 0.0 || risk == 0.1, "node {node} risk {risk}");
            }
        }
        assert_eq!(
            snapshot.census.infected,
            snapshot.state.recently_infected.iter().filter(|&&f| f).count()
        );
    }
}
