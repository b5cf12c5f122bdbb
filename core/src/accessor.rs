//! Read-only adjacency access used by the traversal engine.
//!
//! The engine never touches graph storage directly. Anything that can list
//! its vertex ids and the edges incident to a vertex can be analyzed: the
//! crate's own [`Graph`] and any `petgraph::Graph` whose edge weight
//! converts into `f64`.

use petgraph::graph::{IndexType, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;

use crate::graph::{EdgeId, Graph, NodeId, TraversalDirection};

/// One neighbor of a vertex together with the edge that reaches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub vertex: NodeId,
    pub edge: EdgeId,
    pub weight: f64,
}

/// Adjacency interface required from the graph storage layer.
///
/// Implementations must be deterministic for a fixed graph snapshot and
/// must not mutate the graph.
pub trait GraphAccessor {
    /// All vertex ids, in a deterministic order.
    fn vertex_ids(&self) -> Vec<NodeId>;

    fn vertex_count(&self) -> usize {
        self.vertex_ids().len()
    }

    fn contains_vertex(&self, vertex: NodeId) -> bool;

    /// True when every edge is traversable both ways regardless of the
    /// requested direction.
    fn is_undirected(&self) -> bool {
        false
    }

    /// Append every edge incident to `vertex` under `direction` to `out`.
    /// Parallel edges and self loops are reported as stored.
    fn incident_edges(&self, vertex: NodeId, direction: TraversalDirection, out: &mut Vec<Neighbor>);

    /// The neighbor set of `vertex`: one entry per adjacent vertex, keeping
    /// the lightest connecting edge (lowest edge id on equal weight).
    /// Self loops are dropped. `out` is cleared first; entries come back
    /// sorted by vertex id.
    fn neighbors(&self, vertex: NodeId, direction: TraversalDirection, out: &mut Vec<Neighbor>) {
        out.clear();
        self.incident_edges(vertex, direction, out);
        out.retain(|n| n.vertex != vertex);
        out.sort_by(|a, b| {
            a.vertex
                .cmp(&b.vertex)
                .then(a.weight.total_cmp(&b.weight))
                .then(a.edge.cmp(&b.edge))
        });
        out.dedup_by_key(|n| n.vertex);
    }
}

impl GraphAccessor for Graph {
    fn vertex_ids(&self) -> Vec<NodeId> {
        self.node_ids()
    }

    fn vertex_count(&self) -> usize {
        self.node_count()
    }

    fn contains_vertex(&self, vertex: NodeId) -> bool {
        self.contains(vertex)
    }

    /// Uses boolean flags rather than boxed iterators so the merge compiles
    /// down to two slice walks.
    fn incident_edges(&self, vertex: NodeId, direction: TraversalDirection, out: &mut Vec<Neighbor>) {
        let (use_out, use_inc) = match direction {
            TraversalDirection::Outgoing => (true, false),
            TraversalDirection::Incoming => (false, true),
            TraversalDirection::Both => (true, true),
        };

        let out_iter = self.neighbors_out(vertex).iter().filter(move |_| use_out);
        let in_iter = self.neighbors_in(vertex).iter().filter(move |_| use_inc);

        out.extend(out_iter.chain(in_iter).map(|e| Neighbor {
            vertex: e.target,
            edge: e.id,
            weight: e.weight,
        }));
    }
}

/// Vertex ids are `NodeIndex::index()`, edge ids are `EdgeIndex::index()`.
/// For undirected petgraph graphs every direction yields all incident edges.
impl<N, E, Ty, Ix> GraphAccessor for petgraph::Graph<N, E, Ty, Ix>
where
    E: Copy + Into<f64>,
    Ty: EdgeType,
    Ix: IndexType,
{
    fn vertex_ids(&self) -> Vec<NodeId> {
        self.node_indices().map(|i| i.index() as NodeId).collect()
    }

    fn vertex_count(&self) -> usize {
        self.node_count()
    }

    fn contains_vertex(&self, vertex: NodeId) -> bool {
        (vertex as usize) < self.node_count()
    }

    fn is_undirected(&self) -> bool {
        !self.is_directed()
    }

    fn incident_edges(&self, vertex: NodeId, direction: TraversalDirection, out: &mut Vec<Neighbor>) {
        use petgraph::Direction::{Incoming, Outgoing};

        if !self.contains_vertex(vertex) {
            return;
        }
        let node = NodeIndex::<Ix>::new(vertex as usize);
        let directions: &[petgraph::Direction] = if !self.is_directed() {
            &[Outgoing]
        } else {
            match direction {
                TraversalDirection::Outgoing => &[Outgoing],
                TraversalDirection::Incoming => &[Incoming],
                TraversalDirection::Both => &[Outgoing, Incoming],
            }
        };

        for &dir in directions {
            for e in self.edges_directed(node, dir) {
                let other = if e.source() == node { e.target() } else { e.source() };
                out.push(Neighbor {
                    vertex: other.index() as NodeId,
                    edge: e.id().index() as EdgeId,
                    weight: (*e.weight()).into(),
                });
            }
        }
    }
}
