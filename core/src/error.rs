use thiserror::Error;

use crate::engine::SearchMode;
use crate::graph::{EdgeId, NodeId};

/// Errors surfaced by the traversal engine and the centrality accumulator.
///
/// Per-source failures carry the source id so the caller can decide whether
/// to skip the source, retry with a different configuration, or abort.
#[derive(Debug, Error)]
pub enum CentralityError {
    #[error("vertex {0} is not in the graph")]
    UnknownVertex(NodeId),

    #[error(
        "edge {edge} ({from} -> {to}) has weight {weight}; weighted search requires finite positive weights"
    )]
    InvalidWeight {
        edge: EdgeId,
        from: NodeId,
        to: NodeId,
        weight: f64,
    },

    #[error(
        "edge {edge} ({from} -> {to}) with weight {weight} vanishes against distance {distance} (source {source_id})"
    )]
    WeightAbsorbed {
        source_id: NodeId,
        edge: EdgeId,
        from: NodeId,
        to: NodeId,
        distance: f64,
        weight: f64,
    },

    #[error("shortest-path count overflowed at vertex {vertex} (source {source_id})")]
    PathCountOverflow { source_id: NodeId, vertex: NodeId },

    #[error("stress count overflowed at vertex {vertex} (source {source_id:?})")]
    StressOverflow {
        source_id: Option<NodeId>,
        vertex: NodeId,
    },

    #[error(
        "vertex {vertex} settled at distance {settled} was relaxed to {candidate} (source {source_id})"
    )]
    SettledVertexRelaxed {
        source_id: NodeId,
        vertex: NodeId,
        settled: f64,
        candidate: f64,
    },

    #[error("{0:?} search does not yield shortest paths and cannot drive centrality")]
    UnsupportedMode(SearchMode),

    #[error("search state was allocated for a different engine")]
    StateMismatch,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("computation cancelled after {completed} of {total} sources")]
    Cancelled { completed: usize, total: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CentralityError {
    /// The source whose run failed, when the failure is confined to one run.
    pub fn source_id(&self) -> Option<NodeId> {
        match self {
            CentralityError::PathCountOverflow { source_id, .. }
            | CentralityError::SettledVertexRelaxed { source_id, .. }
            | CentralityError::WeightAbsorbed { source_id, .. } => Some(*source_id),
            CentralityError::StressOverflow { source_id, .. } => *source_id,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CentralityError>;
