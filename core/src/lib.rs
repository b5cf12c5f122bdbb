//! graph-centrality-core: closeness and betweenness centrality on large
//! sparse graphs.
//!
//! A single-source traversal engine runs BFS, DFS or Dijkstra over any
//! [`GraphAccessor`] and records distances, shortest-path counts and every
//! predecessor on a shortest path. The centrality sweep drives one run per
//! source and layers a Brandes backward pass on top to produce betweenness,
//! stress and edge betweenness alongside closeness, average path length and
//! eccentricity.
//!
//! Ships its own adjacency-list [`Graph`] and also accepts `petgraph`
//! graphs directly.

mod accessor;
mod centrality;
mod config;
mod dag;
mod engine;
mod error;
mod graph;
mod paths;
mod state;

pub use accessor::{GraphAccessor, Neighbor};
pub use centrality::{
    compute_all, compute_betweenness, compute_closeness, BetweennessResult, CentralityResult,
    ClosenessResult, SkippedSource,
};
pub use config::{CancellationToken, CentralityConfig, FailurePolicy, MAX_THREADS};
pub use dag::{DagEdge, ShortestPathDag};
pub use engine::{RunSummary, SearchMode, TraversalEngine};
pub use error::{CentralityError, Result};
pub use graph::{Edge, EdgeId, EdgeRecord, Graph, NodeId, TraversalDirection};
pub use paths::PathLengthData;
pub use state::{Predecessor, SearchState};
