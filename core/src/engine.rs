//! Single-source search engine shared by BFS, DFS and Dijkstra.
//!
//! One engine shape, parameterized per run by a frontier ordering (FIFO
//! queue, min-heap on tentative distance, LIFO stack) and an edge weight
//! rule (unit or declared). BFS and Dijkstra record every predecessor that
//! lies on a shortest path and count shortest paths exactly; DFS records
//! only its discovery tree.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::accessor::{GraphAccessor, Neighbor};
use crate::dag::ShortestPathDag;
use crate::error::{CentralityError, Result};
use crate::graph::{NodeId, TraversalDirection};
use crate::paths::PathLengthData;
use crate::state::{PredecessorLink, SearchState, VertexIndex};

/// Traversal strategy for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Breadth-first, unit edge weights.
    #[default]
    Bfs,
    /// Depth-first discovery tree; not a shortest-path search.
    Dfs,
    /// Declared edge weights, binary-heap frontier.
    Dijkstra,
}

impl SearchMode {
    /// Whether distances and path counts produced by this mode are
    /// shortest-path quantities.
    pub fn is_shortest_path(self) -> bool {
        !matches!(self, SearchMode::Dfs)
    }

    fn weight_rule(self) -> WeightRule {
        match self {
            SearchMode::Dijkstra => WeightRule::Declared,
            SearchMode::Bfs | SearchMode::Dfs => WeightRule::Unit,
        }
    }
}

/// Outcome of one single-source run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub source: NodeId,
    pub mode: SearchMode,
    /// Vertices finalized, source included.
    pub reached: usize,
    pub path_lengths: PathLengthData,
}

#[derive(Debug, Clone, Copy)]
enum WeightRule {
    Unit,
    Declared,
}

impl WeightRule {
    fn weight(self, from: NodeId, neighbor: &Neighbor) -> Result<f64> {
        match self {
            WeightRule::Unit => Ok(1.0),
            WeightRule::Declared => check_weight(from, neighbor),
        }
    }
}

/// Weighted search only admits finite, strictly positive weights: a zero
/// weight cycle would make the shortest-path count unbounded.
pub(crate) fn check_weight(from: NodeId, neighbor: &Neighbor) -> Result<f64> {
    let w = neighbor.weight;
    if w.is_finite() && w > 0.0 {
        Ok(w)
    } else {
        Err(CentralityError::InvalidWeight {
            edge: neighbor.edge,
            from,
            to: neighbor.vertex,
            weight: w,
        })
    }
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest distance.
/// Ties resolve by slot for a deterministic settle order.
#[derive(Debug, Clone, Copy)]
struct MinScored(f64, usize);

impl PartialEq for MinScored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MinScored {}

impl PartialOrd for MinScored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinScored {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.total_cmp(&self.0).then_with(|| other.1.cmp(&self.1))
    }
}

/// Frontier ordering for shortest-path modes.
trait Frontier {
    fn push(&mut self, slot: usize, distance: f64);
    fn pop(&mut self) -> Option<(usize, f64)>;
}

impl Frontier for VecDeque<(usize, f64)> {
    fn push(&mut self, slot: usize, distance: f64) {
        self.push_back((slot, distance));
    }
    fn pop(&mut self) -> Option<(usize, f64)> {
        self.pop_front()
    }
}

impl Frontier for BinaryHeap<MinScored> {
    fn push(&mut self, slot: usize, distance: f64) {
        BinaryHeap::push(self, MinScored(distance, slot));
    }
    fn pop(&mut self) -> Option<(usize, f64)> {
        BinaryHeap::pop(self).map(|MinScored(d, slot)| (slot, d))
    }
}

/// Single-source traversal engine over a read-only graph.
///
/// The vertex set is indexed once at construction; [`SearchState`]s created
/// by [`TraversalEngine::new_state`] share that index and can be reused
/// across runs.
pub struct TraversalEngine<'g, G: ?Sized> {
    graph: &'g G,
    index: Arc<VertexIndex>,
    direction: TraversalDirection,
}

impl<'g, G> TraversalEngine<'g, G>
where
    G: GraphAccessor + ?Sized,
{
    /// Index the vertex set of `graph` for searches that follow edges in
    /// `direction`.
    pub fn new(graph: &'g G, direction: TraversalDirection) -> Self {
        Self {
            graph,
            index: Arc::new(VertexIndex::new(graph.vertex_ids())),
            direction,
        }
    }

    pub(crate) fn graph(&self) -> &'g G {
        self.graph
    }

    pub fn direction(&self) -> TraversalDirection {
        self.direction
    }

    pub fn vertex_ids(&self) -> &[NodeId] {
        self.index.ids()
    }

    pub fn vertex_count(&self) -> usize {
        self.index.len()
    }

    /// Allocate search state for the whole vertex set.
    pub fn new_state(&self) -> SearchState {
        SearchState::new(Arc::clone(&self.index))
    }

    /// Run one search from `source`. The state is reset first, so after
    /// the call it describes exactly this run.
    pub fn run(&self, source: NodeId, mode: SearchMode, state: &mut SearchState) -> Result<RunSummary> {
        if !Arc::ptr_eq(&self.index, &state.index) {
            return Err(CentralityError::StateMismatch);
        }
        let source_slot = self
            .index
            .slot(source)
            .ok_or(CentralityError::UnknownVertex(source))?;

        state.reset();
        debug_assert!(state.is_fresh());
        state.source = Some(source_slot);

        let outcome = match mode {
            SearchMode::Bfs => {
                let mut queue: VecDeque<(usize, f64)> = VecDeque::new();
                self.shortest_paths(source_slot, mode.weight_rule(), &mut queue, state)
            }
            SearchMode::Dijkstra => {
                let mut heap: BinaryHeap<MinScored> = BinaryHeap::new();
                self.shortest_paths(source_slot, mode.weight_rule(), &mut heap, state)
            }
            SearchMode::Dfs => self.depth_first(source_slot, None, state),
        };

        if let Err(e) = outcome {
            // A failed run leaves nothing behind for the next caller.
            state.reset();
            return Err(e);
        }

        Ok(RunSummary {
            source,
            mode,
            reached: state.order.len(),
            path_lengths: state.path_lengths.clone(),
        })
    }

    /// Run one search and materialize its shortest-path DAG.
    pub fn run_with_dag(
        &self,
        source: NodeId,
        mode: SearchMode,
        state: &mut SearchState,
    ) -> Result<(RunSummary, ShortestPathDag)> {
        let summary = self.run(source, mode, state)?;
        let dag = ShortestPathDag::from_state(state);
        Ok((summary, dag))
    }

    /// Depth-first spanning forest over the whole vertex set.
    ///
    /// Roots are taken in vertex-id order; each tree only enters vertices
    /// not already covered by an earlier tree.
    pub fn spanning_forest(&self, state: &mut SearchState) -> Result<Vec<ShortestPathDag>> {
        if !Arc::ptr_eq(&self.index, &state.index) {
            return Err(CentralityError::StateMismatch);
        }
        let mut covered = vec![false; self.index.len()];
        let mut forest = Vec::new();

        for root in 0..self.index.len() {
            if covered[root] {
                continue;
            }
            state.reset();
            state.source = Some(root);
            self.depth_first(root, Some(covered.as_slice()), state)?;
            for &slot in &state.order {
                covered[slot] = true;
            }
            forest.push(ShortestPathDag::from_state(state));
        }
        state.reset();
        Ok(forest)
    }

    /// BFS/Dijkstra core. The frontier decides the settle order; the
    /// relaxation below is shared.
    fn shortest_paths<F: Frontier>(
        &self,
        source: usize,
        rule: WeightRule,
        frontier: &mut F,
        state: &mut SearchState,
    ) -> Result<()> {
        let source_id = self.index.id(source);
        state.discover(source, 0.0, 1, None);
        frontier.push(source, 0.0);

        let mut neighbors = std::mem::take(&mut state.scratch);
        let result = (|| -> Result<()> {
            while let Some((current, queued_distance)) = frontier.pop() {
                let vs = &state.slots[current];
                if vs.settled || vs.distance != Some(queued_distance) {
                    // Stale heap entry superseded by a shorter distance.
                    continue;
                }
                state.settle(current);

                let current_id = self.index.id(current);
                let current_distance = queued_distance;
                let current_count = state.slots[current].path_count;
                self.graph.neighbors(current_id, self.direction, &mut neighbors);

                for nb in neighbors.iter() {
                    let w = rule.weight(current_id, nb)?;
                    let target = self
                        .index
                        .slot(nb.vertex)
                        .ok_or(CentralityError::UnknownVertex(nb.vertex))?;
                    let candidate = current_distance + w;
                    if candidate == current_distance {
                        return Err(CentralityError::WeightAbsorbed {
                            source_id,
                            edge: nb.edge,
                            from: current_id,
                            to: nb.vertex,
                            distance: current_distance,
                            weight: w,
                        });
                    }
                    let link = PredecessorLink {
                        slot: current,
                        edge: nb.edge,
                        weight: w,
                    };

                    let (known, is_settled) = {
                        let tv = &state.slots[target];
                        (tv.distance, tv.settled)
                    };
                    match known {
                        None => {
                            state.discover(target, candidate, current_count, Some(link));
                            frontier.push(target, candidate);
                        }
                        Some(settled) if is_settled => {
                            if candidate <= settled {
                                return Err(CentralityError::SettledVertexRelaxed {
                                    source_id,
                                    vertex: nb.vertex,
                                    settled,
                                    candidate,
                                });
                            }
                        }
                        Some(d) if candidate == d => {
                            let tv = &mut state.slots[target];
                            tv.path_count = tv.path_count.checked_add(current_count).ok_or(
                                CentralityError::PathCountOverflow {
                                    source_id,
                                    vertex: nb.vertex,
                                },
                            )?;
                            tv.predecessors.push(link);
                        }
                        Some(d) if candidate < d => {
                            let tv = &mut state.slots[target];
                            tv.distance = Some(candidate);
                            tv.path_count = current_count;
                            tv.predecessors.clear();
                            tv.predecessors.push(link);
                            frontier.push(target, candidate);
                        }
                        Some(_) => {}
                    }
                }
            }
            Ok(())
        })();
        state.scratch = neighbors;
        result
    }

    /// Iterative DFS from `source`. Distance is depth in the discovery
    /// tree, the single predecessor is the discovering parent, and every
    /// path count is 1. Slots flagged in `blocked` are never entered.
    fn depth_first(&self, source: usize, blocked: Option<&[bool]>, state: &mut SearchState) -> Result<()> {
        let mut stack: Vec<(usize, Option<PredecessorLink>, u32)> = vec![(source, None, 0)];
        let mut neighbors = std::mem::take(&mut state.scratch);

        while let Some((current, link, depth)) = stack.pop() {
            if state.slots[current].distance.is_some() {
                continue;
            }
            state.discover(current, depth as f64, 1, link);
            state.settle(current);

            let current_id = self.index.id(current);
            self.graph.neighbors(current_id, self.direction, &mut neighbors);
            // Reverse so the lowest-id neighbor is explored first.
            for nb in neighbors.iter().rev() {
                let Some(next) = self.index.slot(nb.vertex) else {
                    let missing = nb.vertex;
                    state.scratch = neighbors;
                    return Err(CentralityError::UnknownVertex(missing));
                };
                if state.slots[next].distance.is_some() || blocked.is_some_and(|b| b[next]) {
                    continue;
                }
                stack.push((
                    next,
                    Some(PredecessorLink {
                        slot: current,
                        edge: nb.edge,
                        weight: 1.0,
                    }),
                    depth + 1,
                ));
            }
        }

        state.scratch = neighbors;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeRecord, Graph};

    fn make_chain(n: u64) -> Graph {
        let mut g = Graph::new();
        g.load_edges((0..n - 1).map(|i| EdgeRecord::unit(i, i + 1)));
        g
    }

    fn make_star(center: u64, leaves: u64) -> Graph {
        let mut g = Graph::new();
        g.load_edges((1..=leaves).map(|i| EdgeRecord::unit(center, center + i)));
        g
    }

    fn make_cycle(n: u64) -> Graph {
        let mut g = Graph::new();
        g.load_edges((0..n).map(|i| EdgeRecord::unit(i, (i + 1) % n)));
        g
    }

    /// Figure 24.6 of Cormen et al., 3rd edition.
    fn make_cormen(weighted: bool) -> Graph {
        let edges = [
            (1, 2, 10.0),
            (1, 4, 5.0),
            (5, 1, 7.0),
            (2, 4, 2.0),
            (4, 2, 3.0),
            (3, 5, 4.0),
            (2, 3, 1.0),
            (4, 3, 9.0),
            (5, 3, 6.0),
            (4, 5, 2.0),
        ];
        let mut g = Graph::new();
        g.load_edges(edges.iter().map(|&(from, to, w)| {
            EdgeRecord::weighted(from, to, if weighted { w } else { 1.0 })
        }));
        g
    }

    fn assert_consistent(state: &SearchState) {
        let source = state.source().unwrap();
        assert_eq!(state.distance(source), Some(0.0));
        assert!(state.predecessors(source).is_empty());
        assert_eq!(state.path_count(source), 1);
        for v in state.visited().filter(|&v| v != source) {
            let d = state.distance(v).unwrap();
            let preds = state.predecessors(v);
            assert!(!preds.is_empty(), "vertex {} has no predecessor", v);
            let mut sum = 0;
            for p in &preds {
                assert_eq!(state.distance(p.vertex).unwrap() + p.weight, d);
                sum += state.path_count(p.vertex);
            }
            assert_eq!(sum, state.path_count(v), "path count mismatch at {}", v);
        }
    }

    // --- BFS tests ---

    #[test]
    fn test_bfs_chain() {
        let g = make_chain(6);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let summary = engine.run(0, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(summary.reached, 6);
        assert_eq!(state.distance(5), Some(5.0));
        assert_eq!(summary.path_lengths.max_length(), 5.0);
        assert_consistent(&state);
    }

    #[test]
    fn test_bfs_cormen_directed() {
        let g = make_cormen(false);
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let summary = engine.run(1, SearchMode::Bfs, &mut state).unwrap();

        for (v, d) in [(1, 0.0), (2, 1.0), (4, 1.0), (3, 2.0), (5, 2.0)] {
            assert_eq!(state.distance(v), Some(d), "distance of {}", v);
        }
        // 3 is reached through both 2 and 4.
        assert_eq!(state.path_count(3), 2);
        assert_eq!(state.path_count(5), 1);
        assert_eq!(summary.path_lengths.average(), 1.5);
        assert_consistent(&state);
    }

    #[test]
    fn test_bfs_cycle_two_paths() {
        let g = make_cycle(6);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        engine.run(0, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(state.distance(3), Some(3.0));
        assert_eq!(state.path_count(3), 2);
        assert_eq!(state.predecessors(3).len(), 2);
        assert_consistent(&state);
    }

    #[test]
    fn test_bfs_finalization_order_non_decreasing() {
        let g = make_cycle(9);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        engine.run(4, SearchMode::Bfs, &mut state).unwrap();
        let dists: Vec<f64> = state.visited().map(|v| state.distance(v).unwrap()).collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_bfs_directed_unreachable() {
        let g = make_chain(4);
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let summary = engine.run(2, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(summary.reached, 2);
        assert_eq!(state.distance(0), None);
        assert_eq!(state.path_count(0), 0);
    }

    #[test]
    fn test_bfs_star() {
        let g = make_star(0, 100);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let summary = engine.run(0, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(summary.path_lengths.count(), 100);
        assert_eq!(summary.path_lengths.closeness(), 1.0);
    }

    #[test]
    fn test_bfs_isolated_source() {
        let mut g = make_chain(3);
        g.add_node(99);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let summary = engine.run(99, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(summary.reached, 1);
        assert_eq!(summary.path_lengths.closeness(), 0.0);
    }

    #[test]
    fn test_unknown_source() {
        let g = make_chain(3);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let err = engine.run(999, SearchMode::Bfs, &mut state).unwrap_err();
        assert!(matches!(err, CentralityError::UnknownVertex(999)));
    }

    #[test]
    fn test_state_reused_across_runs() {
        let g = make_chain(5);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        engine.run(0, SearchMode::Bfs, &mut state).unwrap();
        engine.run(4, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(state.source(), Some(4));
        assert_eq!(state.distance(0), Some(4.0));
        assert_eq!(state.distance(4), Some(0.0));
        assert_consistent(&state);
    }

    #[test]
    fn test_state_from_other_engine_rejected() {
        let g = make_chain(3);
        let a = TraversalEngine::new(&g, TraversalDirection::Both);
        let b = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = a.new_state();
        assert!(matches!(
            b.run(0, SearchMode::Bfs, &mut state),
            Err(CentralityError::StateMismatch)
        ));
    }

    #[test]
    fn test_path_count_overflow() {
        // Chain of diamonds: the path count doubles at every layer.
        let mut g = Graph::new();
        let layers = 70u64;
        for i in 0..layers {
            let base = i * 3;
            g.load_edges(vec![
                EdgeRecord::unit(base, base + 1),
                EdgeRecord::unit(base, base + 2),
                EdgeRecord::unit(base + 1, base + 3),
                EdgeRecord::unit(base + 2, base + 3),
            ]);
        }
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let err = engine.run(0, SearchMode::Bfs, &mut state).unwrap_err();
        match err {
            CentralityError::PathCountOverflow { source_id, vertex } => {
                assert_eq!(source_id, 0);
                // 2^64 paths first appear at the 64th diamond join.
                assert_eq!(vertex, 64 * 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(state.source().is_none());
    }

    // --- Dijkstra tests ---

    #[test]
    fn test_dijkstra_cormen() {
        let g = make_cormen(true);
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        engine.run(1, SearchMode::Dijkstra, &mut state).unwrap();
        for (v, d) in [(1, 0.0), (2, 8.0), (3, 9.0), (4, 5.0), (5, 7.0)] {
            assert_eq!(state.distance(v), Some(d), "distance of {}", v);
        }
        let preds: Vec<NodeId> = state.predecessors(2).iter().map(|p| p.vertex).collect();
        assert_eq!(preds, vec![4]);
        assert_consistent(&state);
    }

    #[test]
    fn test_dijkstra_replaces_tentative_distance() {
        // 0 -> 2 directly costs 10, via 1 costs 3.
        let mut g = Graph::new();
        g.load_edges(vec![
            EdgeRecord::weighted(0, 2, 10.0),
            EdgeRecord::weighted(0, 1, 1.0),
            EdgeRecord::weighted(1, 2, 2.0),
        ]);
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        engine.run(0, SearchMode::Dijkstra, &mut state).unwrap();
        assert_eq!(state.distance(2), Some(3.0));
        assert_eq!(state.path_count(2), 1);
        assert_eq!(state.predecessors(2)[0].vertex, 1);
    }

    #[test]
    fn test_dijkstra_weighted_ties() {
        // Two routes of cost 3 from 0 to 3.
        let mut g = Graph::new();
        g.load_edges(vec![
            EdgeRecord::weighted(0, 1, 1.0),
            EdgeRecord::weighted(1, 3, 2.0),
            EdgeRecord::weighted(0, 2, 2.0),
            EdgeRecord::weighted(2, 3, 1.0),
        ]);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        engine.run(0, SearchMode::Dijkstra, &mut state).unwrap();
        assert_eq!(state.distance(3), Some(3.0));
        assert_eq!(state.path_count(3), 2);
        assert_consistent(&state);
    }

    #[test]
    fn test_dijkstra_rejects_negative_weight() {
        let mut g = Graph::new();
        g.load_edges(vec![EdgeRecord::weighted(0, 1, 1.0), EdgeRecord::weighted(1, 2, -4.0)]);
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let err = engine.run(0, SearchMode::Dijkstra, &mut state).unwrap_err();
        assert!(matches!(err, CentralityError::InvalidWeight { from: 1, to: 2, .. }));
    }

    #[test]
    fn test_dijkstra_rejects_absorbed_weight() {
        // 1e16 + 1.0 rounds back to 1e16.
        let mut g = Graph::new();
        g.load_edges(vec![
            EdgeRecord::weighted(0, 1, 1e16),
            EdgeRecord::weighted(0, 2, 1e16),
            EdgeRecord::weighted(1, 2, 1.0),
        ]);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let err = engine.run(0, SearchMode::Dijkstra, &mut state).unwrap_err();
        assert!(
            matches!(err, CentralityError::WeightAbsorbed { source_id: 0, weight, .. } if weight == 1.0),
            "unexpected error: {err}"
        );
        assert_eq!(err.source_id(), Some(0));
        assert!(state.source().is_none());
    }

    #[test]
    fn test_bfs_ignores_declared_weights() {
        let mut g = Graph::new();
        g.load_edges(vec![EdgeRecord::weighted(0, 1, -4.0)]);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        engine.run(0, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(state.distance(1), Some(1.0));
    }

    // --- DFS tests ---

    /// Reports an edge from 0 to a vertex missing from `vertex_ids`.
    struct DanglingEdge;

    impl GraphAccessor for DanglingEdge {
        fn vertex_ids(&self) -> Vec<NodeId> {
            vec![0, 1]
        }

        fn contains_vertex(&self, vertex: NodeId) -> bool {
            vertex < 2
        }

        fn incident_edges(&self, vertex: NodeId, _direction: TraversalDirection, out: &mut Vec<Neighbor>) {
            if vertex == 0 {
                out.push(Neighbor { vertex: 1, edge: 0, weight: 1.0 });
                out.push(Neighbor { vertex: 9, edge: 1, weight: 1.0 });
            }
        }
    }

    #[test]
    fn test_dfs_unknown_neighbor() {
        let g = DanglingEdge;
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let err = engine.run(0, SearchMode::Dfs, &mut state).unwrap_err();
        assert!(matches!(err, CentralityError::UnknownVertex(9)));
        assert!(state.source().is_none());

        // The same state serves a clean run afterwards.
        let summary = engine.run(1, SearchMode::Dfs, &mut state).unwrap();
        assert_eq!(summary.reached, 1);
    }

    #[test]
    fn test_dfs_tree_single_predecessor() {
        let g = make_cycle(6);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let summary = engine.run(0, SearchMode::Dfs, &mut state).unwrap();
        assert_eq!(summary.reached, 6);
        // Depth-first goes all the way round through the lowest neighbor.
        assert_eq!(state.distance(5), Some(5.0));
        for v in 1..6 {
            assert_eq!(state.predecessors(v).len(), 1);
            assert_eq!(state.path_count(v), 1);
        }
    }

    #[test]
    fn test_spanning_forest_covers_components() {
        let mut g = make_chain(3);
        g.load_edges(vec![EdgeRecord::unit(10, 11)]);
        g.add_node(20);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let forest = engine.spanning_forest(&mut state).unwrap();

        let roots: Vec<NodeId> = forest.iter().map(|t| t.root()).collect();
        assert_eq!(roots, vec![0, 10, 20]);
        let total: usize = forest.iter().map(|t| t.vertex_count()).sum();
        assert_eq!(total, g.node_count());
        assert!(forest.iter().all(|t| t.edge_count() + 1 == t.vertex_count()));
    }

    #[test]
    fn test_spanning_forest_directed_no_overlap() {
        // 1 -> 0: root 0 reaches nothing, root 1 must not re-enter 0.
        let mut g = Graph::new();
        g.load_edges(vec![EdgeRecord::unit(1, 0), EdgeRecord::unit(1, 2)]);
        let engine = TraversalEngine::new(&g, TraversalDirection::Outgoing);
        let mut state = engine.new_state();
        let forest = engine.spanning_forest(&mut state).unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[1].root(), 1);
        assert!(!forest[1].contains(0));
        assert!(forest[1].contains(2));
    }

    // --- DAG tests ---

    #[test]
    fn test_run_with_dag_multiple_predecessors() {
        let g = make_cycle(4);
        let engine = TraversalEngine::new(&g, TraversalDirection::Both);
        let mut state = engine.new_state();
        let (summary, dag) = engine.run_with_dag(0, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(dag.root(), 0);
        assert_eq!(dag.vertex_count(), summary.reached);
        let mut preds: Vec<NodeId> = dag.predecessors(2).map(|e| e.from).collect();
        preds.sort();
        assert_eq!(preds, vec![1, 3]);
        assert_eq!(dag.edge_count(), 4);
    }

    // --- petgraph adapter ---

    #[test]
    fn test_bfs_over_petgraph() {
        let mut pg = petgraph::graph::UnGraph::<(), f64>::new_undirected();
        let nodes: Vec<_> = (0..4).map(|_| pg.add_node(())).collect();
        pg.add_edge(nodes[0], nodes[1], 1.0);
        pg.add_edge(nodes[1], nodes[2], 1.0);
        pg.add_edge(nodes[0], nodes[3], 5.0);
        pg.add_edge(nodes[3], nodes[2], 1.0);

        let engine = TraversalEngine::new(&pg, TraversalDirection::Both);
        let mut state = engine.new_state();
        engine.run(0, SearchMode::Bfs, &mut state).unwrap();
        assert_eq!(state.path_count(2), 2);

        engine.run(0, SearchMode::Dijkstra, &mut state).unwrap();
        assert_eq!(state.distance(2), Some(2.0));
        assert_eq!(state.path_count(2), 1);
        assert_eq!(state.distance(3), Some(3.0));
    }
}
