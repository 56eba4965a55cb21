//! sim-runner: headless epidemic runner for the contagion engine.
//!
//! Usage:
//!   sim-runner --model sirs --seed 42 --nodes 1000 --attach 5 --db run.db
//!   sim-runner --model si --edges contacts.txt --p 0.01 --seed-nodes 50 --steps 1000
//!   sim-runner --model sirs --frames 500 --db frames.db
//!   sim-runner --db run.db --resume <run_id> --steps 2000

mod recorder;
mod topology;

use anyhow::{anyhow, Result};
use contagion_core::{
    config::{SeedSet, SimParams},
    engine::SimEngine,
    graph::{AdjacencyGraph, ContactGraph},
    model::{ModelKind, TransitionModel},
    observer::FrameBudget,
    si_model::SiModel,
    sirs_model::SirsModel,
    snapshot::Census,
    types::Tick,
};
use recorder::{RunRecord, RunStore, SnapshotRecorder};
use topology::TopologySource;
use serde::de::DeserializeOwned;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let store = RunStore::open(db)?;
    store.migrate()?;

    let (record, graph, resume) = match flag_value(&args, "--resume") {
        Some(run_id) => {
            let mut record = store
                .find_run(run_id)?
                .ok_or_else(|| anyhow!("no run '{run_id}' in {db}"))?;
            if let Some(steps) = parse_flag::<Tick>(&args, "--steps")? {
                record.params.max_steps = steps;
            }
            if TOPOLOGY_FLAGS.iter().any(|f| args.iter().any(|a| a == f)) {
                log::warn!("--resume rebuilds the recorded topology; topology flags are ignored");
            }
            let graph = record.topology.build(record.seed)?;
            record.check_graph(&graph)?;
            (record, graph, true)
        }
        None => {
            let model: ModelKind = flag_value(&args, "--model").unwrap_or("sirs").parse()?;
            let params = build_params(&args, model)?;
            let topology = topology_source(&args)?;
            let graph = topology.build(params.seed)?;
            let run_id = format!("run-{}-{}", params.seed, uuid::Uuid::new_v4().simple());
            let record = RunRecord {
                run_id,
                seed: params.seed,
                model: model.name().to_string(),
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
                topology,
                params,
            };
            (record, graph, false)
        }
    };
    let model: ModelKind = record.model.parse()?;
    let frames = parse_flag::<u64>(&args, "--frames")?;

    println!("contagion — sim-runner");
    println!("  run_id:    {}", record.run_id);
    println!("  model:     {model}");
    println!("  seed:      {}", record.seed);
    println!("  nodes:     {}", graph.node_count());
    println!("  edges:     {}", graph.edge_count());
    println!("  steps:     {}", record.params.max_steps);
    println!("  db:        {db}");
    println!();

    if !resume {
        store.insert_run(&record, env!("CARGO_PKG_VERSION"))?;
    }

    let final_tick = match model {
        ModelKind::Si => drive::<SiModel>(&store, &graph, &record, resume, frames)?,
        ModelKind::Sirs => drive::<SirsModel>(&store, &graph, &record, resume, frames)?,
    };

    print_summary(&store, &record.run_id, final_tick)
}

/// Build (or resume) the engine and run it to completion, recording
/// every snapshot. Returns the final tick.
fn drive<M>(
    store: &RunStore,
    graph: &AdjacencyGraph,
    record: &RunRecord,
    resume: bool,
    frames: Option<u64>,
) -> Result<Tick>
where
    M: TransitionModel,
    M::State: DeserializeOwned,
{
    let mut engine = if resume {
        let snapshot = store
            .latest_snapshot::<M::State>(&record.run_id)?
            .ok_or_else(|| anyhow!("run {} has no recorded snapshots", record.run_id))?;
        SimEngine::<M>::resume(graph, &record.params, snapshot)?
    } else {
        SimEngine::<M>::new(record.run_id.clone(), graph, &record.params)?
    };
    log::info!("driving {} on {} nodes", engine.model().name(), graph.node_count());

    let recorder = SnapshotRecorder::new(store);
    let final_tick = match frames {
        Some(budget) => engine.run(&mut FrameBudget::new(recorder, budget))?,
        None => {
            let mut recorder = recorder;
            engine.run(&mut recorder)?
        }
    };
    Ok(final_tick)
}

/// Defaults follow the two reference setups: SI with p = 0.01 seeded at
/// node 50 for 1000 steps, SIRS with x = 0.001 and recovery 0.01 for 500.
fn build_params(args: &[String], model: ModelKind) -> Result<SimParams> {
    let mut params = match flag_value(args, "--config") {
        Some(path) => SimParams::load(path)?,
        None => match model {
            ModelKind::Si => SimParams {
                spontaneous_infection:    0.0,
                transmission_probability: 0.01,
                recovery_rate:            0.01,
                max_steps:                1000,
                initial_infected:         SeedSet::Nodes(vec![50]),
                seed:                     42,
            },
            ModelKind::Sirs => SimParams {
                spontaneous_infection:    0.001,
                transmission_probability: 0.0,
                recovery_rate:            0.01,
                max_steps:                500,
                initial_infected:         SeedSet::Nodes(Vec::new()),
                seed:                     42,
            },
        },
    };

    if let Some(seed) = parse_flag(args, "--seed")? {
        params.seed = seed;
    }
    if let Some(steps) = parse_flag(args, "--steps")? {
        params.max_steps = steps;
    }
    if let Some(x) = parse_flag(args, "--x")? {
        params.spontaneous_infection = x;
    }
    if let Some(p) = parse_flag(args, "--p")? {
        params.transmission_probability = p;
    }
    if let Some(rate) = parse_flag(args, "--recovery")? {
        params.recovery_rate = rate;
    }
    if let Some(share) = parse_flag(args, "--seed-fraction")? {
        params.initial_infected = SeedSet::Fraction(share);
    }
    if let Some(list) = flag_value(args, "--seed-nodes") {
        let nodes = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse().map_err(|e| anyhow!("bad seed node '{s}': {e}")))
            .collect::<Result<Vec<_>>>()?;
        params.initial_infected = SeedSet::Nodes(nodes);
    }

    params.validate()?;
    Ok(params)
}

/// Flags that pick the graph of a new run.
const TOPOLOGY_FLAGS: [&str; 4] = ["--edges", "--directed", "--nodes", "--attach"];

fn topology_source(args: &[String]) -> Result<TopologySource> {
    let directed = args.iter().any(|a| a == "--directed");
    if let Some(path) = flag_value(args, "--edges") {
        return Ok(TopologySource::EdgeList { path: path.to_string(), directed });
    }
    if directed {
        log::warn!("--directed only applies to --edges; generated graphs are undirected");
    }
    Ok(TopologySource::BarabasiAlbert {
        nodes:  parse_flag(args, "--nodes")?.unwrap_or(1000),
        attach: parse_flag(args, "--attach")?.unwrap_or(5),
    })
}

fn print_summary(store: &RunStore, run_id: &str, final_tick: Tick) -> Result<()> {
    let history = store.census_history(run_id)?;
    let last = history.last().map(|(_, c)| *c).unwrap_or_default();
    let peak = history
        .iter()
        .max_by_key(|(tick, c)| (c.infected, std::cmp::Reverse(*tick)))
        .copied();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {run_id}");
    println!("  final tick:   {final_tick}");
    println!("  snapshots:    {}", store.snapshot_count(run_id)?);
    print_census("  final", &last);
    match peak {
        Some((tick, census)) => println!("  peak infected: {} at tick {tick}", census.infected),
        None => println!("  (no snapshots recorded)"),
    }
    Ok(())
}

fn print_census(label: &str, c: &Census) {
    println!(
        "{label}:        S={} I={} R={}",
        c.susceptible, c.infected, c.recovering
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_flag<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    flag_value(args, flag)
        .map(|v| v.parse().map_err(|e| anyhow!("bad value for {flag}: '{v}': {e}")))
        .transpose()
}
