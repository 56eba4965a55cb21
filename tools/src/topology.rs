//! Topology construction for the runner: generated or loaded graphs.
//!
//! The engine only ever sees the finished AdjacencyGraph.

use anyhow::{anyhow, bail, Result};
use contagion_core::{
    graph::{AdjacencyGraph, ContactGraph},
    rng::{RngBank, SimRng, StreamSlot},
    types::NodeId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Largest node id an edge list may name. Node ids index a dense
/// adjacency vector, so a stray huge id would allocate for every id below it.
pub const MAX_NODE_ID: NodeId = (1 << 24) - 1;

/// Where a run's graph came from. Stored with the run so a resumed run
/// rebuilds the exact same graph whatever flags it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySource {
    BarabasiAlbert { nodes: usize, attach: usize },
    EdgeList { path: String, directed: bool },
}

impl TopologySource {
    /// Generated graphs draw from the Topology stream of `seed`.
    pub fn build(&self, seed: u64) -> Result<AdjacencyGraph> {
        match self {
            Self::BarabasiAlbert { nodes, attach } => {
                let mut rng = RngBank::new(seed).for_stream(StreamSlot::Topology);
                barabasi_albert(*nodes, *attach, &mut rng)
            }
            Self::EdgeList { path, directed } => load_edge_list(path, *directed),
        }
    }
}

/// Preferential-attachment graph: starts from a star on `m + 1` nodes,
/// then every new node links to `m` distinct existing nodes picked with
/// probability proportional to their degree.
pub fn barabasi_albert(n: usize, m: usize, rng: &mut SimRng) -> Result<AdjacencyGraph> {
    if m < 1 || m >= n {
        bail!("barabasi_albert needs 1 <= m < n, got n={n} m={m}");
    }

    let mut graph = AdjacencyGraph::isolated(n, false);
    // One entry per edge endpoint, so sampling from it is degree-weighted.
    let mut repeated: Vec<NodeId> = Vec::with_capacity(2 * n * m);
    for leaf in 1..=m {
        graph.add_edge(0, leaf)?;
        repeated.extend([0, leaf]);
    }

    for source in (m + 1)..n {
        let targets = random_subset(&repeated, m, rng);
        for &target in &targets {
            graph.add_edge(source, target)?;
        }
        repeated.extend(targets);
        repeated.extend(std::iter::repeat(source).take(m));
    }
    Ok(graph)
}

fn random_subset(pool: &[NodeId], m: usize, rng: &mut SimRng) -> BTreeSet<NodeId> {
    let mut picked = BTreeSet::new();
    while picked.len() < m {
        let idx = rng.next_u64_below(pool.len() as u64) as usize;
        picked.insert(pool[idx]);
    }
    picked
}

/// Read a whitespace-separated edge list ("a b" per line, `#` comments).
/// The node count is one past the largest id seen.
pub fn load_edge_list(path: &str, directed: bool) -> Result<AdjacencyGraph> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Cannot read {path}: {e}"))?;
    let graph = parse_edge_list(&content, directed).map_err(|e| anyhow!("{path}: {e}"))?;
    log::info!("loaded {} nodes / {} edges from {path}", graph.node_count(), graph.edge_count());
    Ok(graph)
}

pub fn parse_edge_list(content: &str, directed: bool) -> Result<AdjacencyGraph> {
    let mut edges = Vec::new();
    let mut node_count = 0;

    for (lineno, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (a, b) = match (fields.next(), fields.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => bail!("line {}: expected two node ids, got '{line}'", lineno + 1),
        };
        let a: NodeId = a
            .parse()
            .map_err(|e| anyhow!("line {}: bad node id '{a}': {e}", lineno + 1))?;
        let b: NodeId = b
            .parse()
            .map_err(|e| anyhow!("line {}: bad node id '{b}': {e}", lineno + 1))?;
        let top = a.max(b);
        if top > MAX_NODE_ID {
            bail!("line {}: node id {top} exceeds the limit of {MAX_NODE_ID}", lineno + 1);
        }
        node_count = node_count.max(top + 1);
        edges.push((a, b));
    }

    Ok(AdjacencyGraph::from_edges(node_count, edges, directed)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barabasi_albert_has_expected_edge_count() {
        let mut rng = SimRng::new(42);
        let g = barabasi_albert(200, 3, &mut rng).unwrap();
        assert_eq!(g.node_count(), 200);
        // star edges + m per added node
        assert_eq!(g.edge_count(), 3 + (200 - 4) * 3);
        for v in 4..200 {
            assert!(g.degree(v) >= 3, "node {v} has degree {}", g.degree(v));
        }
    }

    #[test]
    fn barabasi_albert_is_deterministic() {
        let a = barabasi_albert(100, 2, &mut SimRng::new(9)).unwrap();
        let b = barabasi_albert(100, 2, &mut SimRng::new(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn barabasi_albert_rejects_bad_m() {
        assert!(barabasi_albert(5, 0, &mut SimRng::new(1)).is_err());
        assert!(barabasi_albert(5, 5, &mut SimRng::new(1)).is_err());
    }

    #[test]
    fn edge_list_parses_with_comments() {
        let text = "# netscience sample\n0 1\n1 2 # trailing\n\n2 4\n";
        let g = parse_edge_list(text, false).unwrap();
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.edge_count(), 3);
        assert!(g.neighbors(3).is_empty());
    }

    #[test]
    fn edge_list_reports_bad_lines() {
        let err = parse_edge_list("0 1\n2\n", false).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
        assert!(parse_edge_list("0 x\n", false).is_err());
    }

    #[test]
    fn edge_list_rejects_ids_past_the_limit() {
        let err = parse_edge_list("0 1\n0 100000000000\n", false).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
        assert!(err.to_string().contains("exceeds"), "{err}");

        let max = format!("{} 0\n", usize::MAX);
        assert!(parse_edge_list(&max, false).is_err());
    }

    #[test]
    fn recorded_source_rebuilds_the_same_graph() {
        let source = TopologySource::BarabasiAlbert { nodes: 300, attach: 3 };
        let json = serde_json::to_string(&source).unwrap();
        let restored: TopologySource = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, source);
        assert_eq!(restored.build(42).unwrap(), source.build(42).unwrap());

        let denser = TopologySource::BarabasiAlbert { nodes: 300, attach: 5 };
        assert_ne!(denser.build(42).unwrap().edge_count(), source.build(42).unwrap().edge_count());
    }
}
