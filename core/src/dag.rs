use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::graph::{EdgeId, NodeId};
use crate::state::SearchState;

/// A predecessor relation `from -> to` recorded by a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DagEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub edge: EdgeId,
    pub weight: f64,
}

/// Shortest-path DAG of one run: the reached vertices in finalization order
/// and every predecessor link between them. For DFS runs this is the
/// discovery tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortestPathDag {
    root: NodeId,
    vertices: Vec<NodeId>,
    edges: Vec<DagEdge>,
    /// Target vertex -> positions in `edges`.
    incoming: HashMap<NodeId, Vec<usize>>,
}

impl ShortestPathDag {
    /// Snapshot the predecessor structure held by `state`. Empty if no run
    /// has happened since the last reset.
    pub fn from_state(state: &SearchState) -> Self {
        let root = state.source().unwrap_or_default();
        let vertices: Vec<NodeId> = state.visited().collect();
        let mut edges = Vec::new();
        let mut incoming: HashMap<NodeId, Vec<usize>> = HashMap::new();

        for &to in &vertices {
            for p in state.predecessors(to) {
                incoming.entry(to).or_default().push(edges.len());
                edges.push(DagEdge {
                    from: p.vertex,
                    to,
                    edge: p.edge,
                    weight: p.weight,
                });
            }
        }

        Self {
            root,
            vertices,
            edges,
            incoming,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Reached vertices in finalization order, root first.
    pub fn vertices(&self) -> &[NodeId] {
        &self.vertices
    }

    pub fn contains(&self, vertex: NodeId) -> bool {
        self.vertices.contains(&vertex)
    }

    pub fn edges(&self) -> &[DagEdge] {
        &self.edges
    }

    pub fn predecessors(&self, vertex: NodeId) -> impl Iterator<Item = &DagEdge> + '_ {
        self.incoming
            .get(&vertex)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Export as a directed petgraph graph, node weights carrying vertex ids.
    /// Node indices follow finalization order.
    pub fn to_petgraph(&self) -> petgraph::Graph<NodeId, DagEdge> {
        let mut g = petgraph::Graph::with_capacity(self.vertices.len(), self.edges.len());
        let index: HashMap<NodeId, NodeIndex> = self
            .vertices
            .iter()
            .map(|&v| (v, g.add_node(v)))
            .collect();
        for e in &self.edges {
            if let (Some(&a), Some(&b)) = (index.get(&e.from), index.get(&e.to)) {
                g.add_edge(a, b, *e);
            }
        }
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SearchMode, TraversalEngine};
    use crate::graph::{EdgeRecord, Graph, TraversalDirection};

    fn make_diamond() -> Graph {
        let mut g = Graph::new();
        g.load_edges(vec![
            EdgeRecord::unit(0, 1),
            EdgeRecord::unit(0, 2),
            EdgeRecord::unit(1, 3),
            EdgeRecord::unit(2, 3),
            EdgeRecord::unit(3, 4),
        ]);
        g
    }

    #[test]
    fn test_dag_from_fresh_state_is_empty() {
        let g = make_diamond();
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let state = engine.new_state();
        let dag = ShortestPathDag::from_state(&state);
        assert_eq!(dag.vertex_count(), 0);
        assert_eq!(dag.edge_count(), 0);
    }

    #[test]
    fn test_dag_diamond() {
        let g = make_diamond();
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let (_, dag) = engine.run_with_dag(0, SearchMode::Bfs, &mut state).unwrap();

        assert_eq!(dag.vertices()[0], 0);
        assert_eq!(dag.vertex_count(), 5);
        assert_eq!(dag.edge_count(), 5);
        assert_eq!(dag.predecessors(3).count(), 2);
        assert_eq!(dag.predecessors(0).count(), 0);
        assert!(dag.edges().iter().all(|e| dag.contains(e.from) && dag.contains(e.to)));
    }

    #[test]
    fn test_dag_to_petgraph_is_acyclic() {
        let g = make_diamond();
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let (_, dag) = engine.run_with_dag(0, SearchMode::Bfs, &mut state).unwrap();

        let pg = dag.to_petgraph();
        assert_eq!(pg.node_count(), 5);
        assert_eq!(pg.edge_count(), 5);
        assert!(!petgraph::algo::is_cyclic_directed(&pg));
        let order = petgraph::algo::toposort(&pg, None).unwrap();
        assert_eq!(pg[order[0]], 0);
    }

    #[test]
    fn test_dag_outlives_state_reuse() {
        let g = make_diamond();
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let (_, dag) = engine.run_with_dag(0, SearchMode::Bfs, &mut state).unwrap();
        engine.run(3, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(dag.root(), 0);
        assert_eq!(dag.vertex_count(), 5);
    }
}
