use crate::types::{NodeId, Tick};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        name:   &'static str,
        value:  f64,
        reason: &'static str,
    },

    #[error("Inconsistent state: {detail}")]
    InconsistentState { detail: String },

    #[error("Run already stopped at tick {tick}")]
    RunStopped { tick: Tick },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub(crate) fn unknown_node(node: NodeId, node_count: usize) -> Self {
        Self::InconsistentState {
            detail: format!("node {node} is outside the graph (node count {node_count})"),
        }
    }

    pub(crate) fn size_mismatch(what: &str, entries: usize, node_count: usize) -> Self {
        Self::InconsistentState {
            detail: format!("{what} has {entries} entries but the graph has {node_count} nodes"),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
