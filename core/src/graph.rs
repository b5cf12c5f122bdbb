use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Stable vertex identifier.
pub type NodeId = u64;

/// Edge identifier, distinguishing parallel edges between the same endpoints.
pub type EdgeId = u64;

/// A directed edge in the adjacency list.
///
/// In `outgoing[a]` the `target` is the head of the edge; in `incoming[b]`
/// it is the tail. The `id` is shared by both entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    pub id: EdgeId,
    pub weight: f64,
}

impl Edge {
    /// Weight used by unweighted loads.
    pub const UNIT_WEIGHT: f64 = 1.0;
}

/// Which stored edges a traversal may follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDirection {
    /// Follow edges from tail to head only.
    Outgoing,
    /// Follow edges from head to tail only.
    Incoming,
    /// Undirected semantics: incoming and outgoing adjacency merged.
    #[default]
    Both,
}

impl TraversalDirection {
    pub fn is_undirected(self) -> bool {
        matches!(self, TraversalDirection::Both)
    }
}

/// One row of a bulk edge load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRecord {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub weight: f64,
}

impl EdgeRecord {
    pub fn unit(from_id: NodeId, to_id: NodeId) -> Self {
        Self {
            from_id,
            to_id,
            weight: Edge::UNIT_WEIGHT,
        }
    }

    pub fn weighted(from_id: NodeId, to_id: NodeId, weight: f64) -> Self {
        Self {
            from_id,
            to_id,
            weight,
        }
    }
}

/// In-memory sparse graph: adjacency lists keyed by vertex id.
///
/// Edges are stored bidirectionally: `outgoing[a]` contains edges from a,
/// `incoming[b]` contains edges into b. Both are populated on insert, so
/// undirected traversal is a merge of the two lists.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    outgoing: HashMap<NodeId, Vec<Edge>>,
    incoming: HashMap<NodeId, Vec<Edge>>,
    nodes: HashSet<NodeId>,
    next_edge_id: EdgeId,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            outgoing: HashMap::with_capacity(node_count),
            incoming: HashMap::with_capacity(node_count),
            nodes: HashSet::with_capacity(node_count),
            next_edge_id: 0,
        }
    }

    /// Register a vertex. Isolated vertices must be added this way since
    /// they never appear in an edge.
    pub fn add_node(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    /// Add a directed edge and return its id. Both endpoints are registered.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: f64) -> EdgeId {
        let id = self.next_edge_id;
        self.next_edge_id += 1;

        self.nodes.insert(from);
        self.nodes.insert(to);
        self.outgoing.entry(from).or_default().push(Edge {
            target: to,
            id,
            weight,
        });
        self.incoming.entry(to).or_default().push(Edge {
            target: from,
            id,
            weight,
        });
        id
    }

    /// Bulk load from edge records. Edge ids are assigned in iteration order.
    pub fn load_edges<I>(&mut self, edges: I)
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        for record in edges {
            self.add_edge(record.from_id, record.to_id, record.weight);
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Get outgoing edges for a node.
    pub fn neighbors_out(&self, id: NodeId) -> &[Edge] {
        self.outgoing.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Get incoming edges for a node.
    pub fn neighbors_in(&self, id: NodeId) -> &[Edge] {
        self.incoming.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Get both outgoing and incoming edges (undirected traversal).
    pub fn neighbors_all(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.neighbors_out(id).iter().chain(self.neighbors_in(id).iter())
    }

    /// All vertex ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(|v| v.len()).sum()
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let nodes_mem = self.nodes.len() * (size_of::<NodeId>() + 16);
        let out_edges: usize = self.outgoing.values().map(|v| v.len() * size_of::<Edge>()).sum();
        let in_edges: usize = self.incoming.values().map(|v| v.len() * size_of::<Edge>()).sum();

        nodes_mem + out_edges + in_edges
    }
}
