//! Contact graph topology — the read-only view the engine queries.
//!
//! RULE: The engine never builds or mutates a topology.
//! Callers construct one (generated or loaded) and lend it to the
//! engine for the lifetime of a run.

use crate::{
    error::{SimError, SimResult},
    types::NodeId,
};

/// The contract every topology must fulfill.
pub trait ContactGraph {
    /// Number of nodes. Nodes are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Out-neighbours of `node` (all neighbours when undirected).
    /// Callers only pass nodes below `node_count()`.
    fn neighbors(&self, node: NodeId) -> &[NodeId];

    fn is_directed(&self) -> bool;

    fn contains(&self, node: NodeId) -> bool {
        node < self.node_count()
    }
}

/// Fails if any neighbour list points outside the node set.
pub fn check_topology(graph: &dyn ContactGraph) -> SimResult<()> {
    let n = graph.node_count();
    for v in 0..n {
        if let Some(&w) = graph.neighbors(v).iter().find(|&&w| !graph.contains(w)) {
            return Err(SimError::unknown_node(w, n));
        }
    }
    Ok(())
}

/// Adjacency-list topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyGraph {
    adjacency: Vec<Vec<NodeId>>,
    directed:  bool,
}

impl AdjacencyGraph {
    /// Graph with `node_count` nodes and no edges.
    pub fn isolated(node_count: usize, directed: bool) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
            directed,
        }
    }

    /// Build from an edge list. Undirected edges are stored in both
    /// directions; duplicate edges and self-loops are dropped.
    pub fn from_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (NodeId, NodeId)>,
        directed: bool,
    ) -> SimResult<Self> {
        let mut graph = Self::isolated(node_count, directed);
        for (a, b) in edges {
            graph.add_edge(a, b)?;
        }
        Ok(graph)
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> SimResult<()> {
        let n = self.adjacency.len();
        for node in [a, b] {
            if node >= n {
                return Err(SimError::unknown_node(node, n));
            }
        }
        if a == b {
            return Ok(());
        }
        push_unique(&mut self.adjacency[a], b);
        if !self.directed {
            push_unique(&mut self.adjacency[b], a);
        }
        Ok(())
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map_or(0, Vec::len)
    }

    /// Number of stored edges (undirected edges counted once).
    pub fn edge_count(&self) -> usize {
        let arcs: usize = self.adjacency.iter().map(Vec::len).sum();
        if self.directed { arcs } else { arcs / 2 }
    }
}

impl ContactGraph for AdjacencyGraph {
    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_directed(&self) -> bool {
        self.directed
    }
}

fn push_unique(list: &mut Vec<NodeId>, node: NodeId) {
    if !list.contains(&node) {
        list.push(node);
    }
}
