use std::collections::HashMap;
use std::sync::Arc;

use crate::accessor::Neighbor;
use crate::graph::{EdgeId, NodeId};
use crate::paths::PathLengthData;

/// Dense slot numbering for the vertex set, built once per engine.
#[derive(Debug)]
pub(crate) struct VertexIndex {
    ids: Vec<NodeId>,
    slots: HashMap<NodeId, usize>,
}

impl VertexIndex {
    pub(crate) fn new(ids: Vec<NodeId>) -> Self {
        let slots = ids.iter().enumerate().map(|(slot, &id)| (id, slot)).collect();
        Self { ids, slots }
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub(crate) fn id(&self, slot: usize) -> NodeId {
        self.ids[slot]
    }

    pub(crate) fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Predecessor link stored per vertex: the preceding slot and the edge used.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PredecessorLink {
    pub(crate) slot: usize,
    pub(crate) edge: EdgeId,
    pub(crate) weight: f64,
}

/// A predecessor as seen from outside the crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predecessor {
    pub vertex: NodeId,
    pub edge: EdgeId,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct VertexState {
    /// `None` until discovered; unreachable vertices stay `None`.
    pub(crate) distance: Option<f64>,
    pub(crate) path_count: u64,
    pub(crate) predecessors: Vec<PredecessorLink>,
    pub(crate) settled: bool,
    pub(crate) dependency: f64,
    pub(crate) stress_dependency: u64,
}

impl VertexState {
    fn clear(&mut self) {
        self.distance = None;
        self.path_count = 0;
        self.predecessors.clear();
        self.settled = false;
        self.dependency = 0.0;
        self.stress_dependency = 0;
    }
}

/// Run-scoped search state for one traversal engine.
///
/// Allocated once for the whole vertex set and cleared between runs. Each
/// concurrently executing run needs its own instance.
#[derive(Debug)]
pub struct SearchState {
    pub(crate) index: Arc<VertexIndex>,
    pub(crate) slots: Vec<VertexState>,
    /// Slots discovered during the current run, for cheap resets.
    pub(crate) touched: Vec<usize>,
    /// Slots in finalization order: non-decreasing distance for BFS and
    /// Dijkstra, preorder for DFS.
    pub(crate) order: Vec<usize>,
    pub(crate) source: Option<usize>,
    pub(crate) path_lengths: PathLengthData,
    pub(crate) scratch: Vec<Neighbor>,
}

impl SearchState {
    pub(crate) fn new(index: Arc<VertexIndex>) -> Self {
        let slots = vec![VertexState::default(); index.len()];
        Self {
            index,
            slots,
            touched: Vec::new(),
            order: Vec::new(),
            source: None,
            path_lengths: PathLengthData::new(),
            scratch: Vec::new(),
        }
    }

    /// Clear everything written by the previous run. Only touched slots are
    /// visited, so the cost is proportional to the previous run's reach.
    pub fn reset(&mut self) {
        for &slot in &self.touched {
            self.slots[slot].clear();
        }
        self.touched.clear();
        self.order.clear();
        self.source = None;
        self.path_lengths.clear();
    }

    /// Mark a slot as discovered for the first time in this run.
    pub(crate) fn discover(&mut self, slot: usize, distance: f64, path_count: u64, link: Option<PredecessorLink>) {
        let vs = &mut self.slots[slot];
        vs.distance = Some(distance);
        vs.path_count = path_count;
        vs.predecessors.clear();
        vs.predecessors.extend(link);
        self.touched.push(slot);
    }

    pub(crate) fn settle(&mut self, slot: usize) {
        self.slots[slot].settled = true;
        self.order.push(slot);
        if Some(slot) != self.source {
            if let Some(d) = self.slots[slot].distance {
                self.path_lengths.record(d);
            }
        }
    }

    pub(crate) fn is_fresh(&self) -> bool {
        self.source.is_none() && self.touched.is_empty()
    }

    /// Source of the current run, if one has run since the last reset.
    pub fn source(&self) -> Option<NodeId> {
        self.source.map(|slot| self.index.id(slot))
    }

    /// Distance from the source, or `None` when `vertex` was not reached or
    /// is unknown. DFS reports tree depth.
    pub fn distance(&self, vertex: NodeId) -> Option<f64> {
        self.index.slot(vertex).and_then(|slot| self.slots[slot].distance)
    }

    /// Number of shortest paths from the source; 0 for unreached vertices.
    pub fn path_count(&self, vertex: NodeId) -> u64 {
        self.index
            .slot(vertex)
            .map(|slot| self.slots[slot].path_count)
            .unwrap_or(0)
    }

    /// Predecessor links recorded for `vertex`, in the order they were
    /// found. Empty for the source and for unreached vertices.
    pub fn predecessors(&self, vertex: NodeId) -> Vec<Predecessor> {
        let Some(slot) = self.index.slot(vertex) else {
            return Vec::new();
        };
        self.slots[slot]
            .predecessors
            .iter()
            .map(|link| Predecessor {
                vertex: self.index.id(link.slot),
                edge: link.edge,
                weight: link.weight,
            })
            .collect()
    }

    /// Vertices reached by the current run in finalization order.
    pub fn visited(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().map(|&slot| self.index.id(slot))
    }

    pub fn reached_count(&self) -> usize {
        self.order.len()
    }

    pub fn path_lengths(&self) -> &PathLengthData {
        &self.path_lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_state() -> SearchState {
        SearchState::new(Arc::new(VertexIndex::new(vec![10, 20, 30])))
    }

    #[test]
    fn test_reset_clears_touched_slots() {
        let mut state = make_state();
        state.source = Some(0);
        state.discover(0, 0.0, 1, None);
        state.settle(0);
        state.discover(
            2,
            1.0,
            1,
            Some(PredecessorLink {
                slot: 0,
                edge: 7,
                weight: 1.0,
            }),
        );
        state.settle(2);
        state.slots[2].dependency = 3.5;

        assert_eq!(state.source(), Some(10));
        assert_eq!(state.path_lengths().count(), 1);
        assert_eq!(
            state.predecessors(30),
            vec![Predecessor {
                vertex: 10,
                edge: 7,
                weight: 1.0
            }]
        );

        state.reset();
        assert!(state.is_fresh());
        assert_eq!(state.distance(30), None);
        assert_eq!(state.path_count(30), 0);
        assert!(state.predecessors(30).is_empty());
        assert_eq!(state.slots[2].dependency, 0.0);
        assert_eq!(state.visited().count(), 0);
    }

    #[test]
    fn test_unknown_vertex_queries() {
        let state = make_state();
        assert_eq!(state.distance(99), None);
        assert_eq!(state.path_count(99), 0);
        assert!(state.predecessors(99).is_empty());
    }
}
