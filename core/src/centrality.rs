//! Closeness and betweenness centrality over all sources.
//!
//! One traversal per source drives both measures. Closeness comes from the
//! run's path-length data; betweenness, stress and edge betweenness come
//! from a Brandes backward pass over the run's predecessor lists, walking
//! vertices in reverse finalization order (non-increasing distance).
//!
//! Sources are processed sequentially with one reused [`SearchState`], or
//! in parallel with rayon where every worker owns its own state and partial
//! totals. A run's contributions are buffered and committed only when the
//! whole run succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accessor::{GraphAccessor, Neighbor};
use crate::config::{CentralityConfig, FailurePolicy};
use crate::engine::{check_weight, RunSummary, SearchMode, TraversalEngine};
use crate::error::{CentralityError, Result};
use crate::graph::{EdgeId, NodeId, TraversalDirection};
use crate::state::SearchState;

/// A source whose run failed under [`FailurePolicy::SkipSource`].
///
/// An undirected result with skipped sources is no longer symmetric: pairs
/// involving a skipped source were only counted from their other end, yet
/// the totals are still halved. Stress halves by integer division, so an
/// odd total rounds down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source_id: NodeId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClosenessResult {
    /// Inverse average shortest-path length to reachable vertices; 0 for
    /// vertices that reach nothing.
    pub closeness: HashMap<NodeId, f64>,
    pub average_path_length: HashMap<NodeId, f64>,
    /// Longest shortest path from each vertex to a vertex it reaches.
    pub eccentricity: HashMap<NodeId, f64>,
    /// Reached (source, target) pairs bucketed by `floor(distance)`, summed
    /// over every source. Undirected pairs appear once from each end.
    pub path_length_distribution: BTreeMap<u64, u64>,
    /// Reached (source, target) pairs bucketed by how many neighbors of the
    /// source are also neighbors of the target. Targets more than two hops
    /// away share none and land in bucket 0.
    pub shared_neighbors: BTreeMap<u64, u64>,
    pub skipped_sources: Vec<SkippedSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetweennessResult {
    /// Unnormalized: unordered pairs for undirected traversal, ordered
    /// pairs for directed traversal.
    pub betweenness: HashMap<NodeId, f64>,
    /// Number of shortest paths through each vertex. Undirected totals are
    /// halved with integer division.
    pub stress: HashMap<NodeId, u64>,
    /// Only edges lying on at least one shortest path appear.
    pub edge_betweenness: HashMap<EdgeId, f64>,
    pub vertex_count: usize,
    pub undirected: bool,
    pub skipped_sources: Vec<SkippedSource>,
}

impl BetweennessResult {
    /// Betweenness scaled into `[0, 1]` by the number of pairs not involving
    /// the vertex: `(n-1)(n-2)` directed, half that undirected. All zero
    /// when the graph has fewer than three vertices.
    pub fn normalized(&self) -> HashMap<NodeId, f64> {
        let n = self.vertex_count as f64;
        let mut pairs = (n - 1.0) * (n - 2.0);
        if self.undirected {
            pairs /= 2.0;
        }
        self.betweenness
            .iter()
            .map(|(&v, &b)| (v, if pairs > 0.0 { b / pairs } else { 0.0 }))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentralityResult {
    pub closeness: ClosenessResult,
    pub betweenness: BetweennessResult,
}

/// Closeness, average path length and eccentricity of every vertex, plus
/// the network-wide path-length and shared-neighbor distributions.
pub fn compute_closeness<G>(graph: &G, config: &CentralityConfig) -> Result<ClosenessResult>
where
    G: GraphAccessor + Sync + ?Sized,
{
    let wants = Wants {
        closeness: true,
        betweenness: false,
    };
    let (totals, _) = sweep(graph, config, wants)?;
    Ok(totals.into_closeness())
}

/// Brandes betweenness, stress and edge betweenness of every vertex and
/// edge. Undirected traversal counts each unordered pair once.
pub fn compute_betweenness<G>(graph: &G, config: &CentralityConfig) -> Result<BetweennessResult>
where
    G: GraphAccessor + Sync + ?Sized,
{
    let wants = Wants {
        closeness: false,
        betweenness: true,
    };
    let undirected = is_undirected(graph, config);
    let (totals, ids) = sweep(graph, config, wants)?;
    Ok(totals.into_betweenness(&ids, undirected))
}

/// Closeness and betweenness from a single traversal per source.
pub fn compute_all<G>(graph: &G, config: &CentralityConfig) -> Result<CentralityResult>
where
    G: GraphAccessor + Sync + ?Sized,
{
    let wants = Wants {
        closeness: true,
        betweenness: true,
    };
    let undirected = is_undirected(graph, config);
    let (mut totals, ids) = sweep(graph, config, wants)?;
    let closeness = ClosenessResult {
        closeness: std::mem::take(&mut totals.closeness),
        average_path_length: std::mem::take(&mut totals.average_path_length),
        eccentricity: std::mem::take(&mut totals.eccentricity),
        path_length_distribution: std::mem::take(&mut totals.path_length_distribution),
        shared_neighbors: std::mem::take(&mut totals.shared_neighbors),
        skipped_sources: totals.skipped.clone(),
    };
    Ok(CentralityResult {
        closeness,
        betweenness: totals.into_betweenness(&ids, undirected),
    })
}

fn is_undirected<G: GraphAccessor + ?Sized>(graph: &G, config: &CentralityConfig) -> bool {
    config.direction.is_undirected() || graph.is_undirected()
}

#[derive(Debug, Clone, Copy)]
struct Wants {
    closeness: bool,
    betweenness: bool,
}

/// Contributions of one run, held back until the run has fully succeeded.
#[derive(Debug, Default)]
struct RunContribution {
    betweenness: Vec<(usize, f64)>,
    stress: Vec<(usize, u64)>,
    edges: Vec<(EdgeId, f64)>,
}

impl RunContribution {
    fn clear(&mut self) {
        self.betweenness.clear();
        self.stress.clear();
        self.edges.clear();
    }
}

/// Running totals owned by one worker. Betweenness and stress are indexed
/// by engine slot.
#[derive(Debug)]
struct Totals {
    closeness: HashMap<NodeId, f64>,
    average_path_length: HashMap<NodeId, f64>,
    eccentricity: HashMap<NodeId, f64>,
    path_length_distribution: BTreeMap<u64, u64>,
    shared_neighbors: BTreeMap<u64, u64>,
    betweenness: Vec<f64>,
    stress: Vec<u64>,
    edge_betweenness: HashMap<EdgeId, f64>,
    skipped: Vec<SkippedSource>,
}

impl Totals {
    fn new(vertex_count: usize, wants: Wants) -> Self {
        let n = if wants.betweenness { vertex_count } else { 0 };
        Self {
            closeness: HashMap::new(),
            average_path_length: HashMap::new(),
            eccentricity: HashMap::new(),
            path_length_distribution: BTreeMap::new(),
            shared_neighbors: BTreeMap::new(),
            betweenness: vec![0.0; n],
            stress: vec![0; n],
            edge_betweenness: HashMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Fold one successful run into the totals. Stress sums are checked
    /// before anything is written.
    fn commit(&mut self, summary: &RunSummary, run: &RunContribution, ids: &[NodeId]) -> Result<()> {
        for &(slot, s) in &run.stress {
            if self.stress[slot].checked_add(s).is_none() {
                return Err(CentralityError::StressOverflow {
                    source_id: Some(summary.source),
                    vertex: ids[slot],
                });
            }
        }
        for &(slot, s) in &run.stress {
            self.stress[slot] += s;
        }
        for &(slot, b) in &run.betweenness {
            self.betweenness[slot] += b;
        }
        for &(edge, c) in &run.edges {
            *self.edge_betweenness.entry(edge).or_insert(0.0) += c;
        }
        Ok(())
    }

    fn record_closeness(&mut self, summary: &RunSummary, shared: &BTreeMap<u64, u64>) {
        let pl = &summary.path_lengths;
        self.closeness.insert(summary.source, pl.closeness());
        self.average_path_length.insert(summary.source, pl.average());
        self.eccentricity.insert(summary.source, pl.max_length());
        add_histogram(&mut self.path_length_distribution, pl.histogram());
        add_histogram(&mut self.shared_neighbors, shared);
    }

    fn merge(mut self, other: Totals, ids: &[NodeId]) -> Result<Totals> {
        for (slot, (a, b)) in self.stress.iter_mut().zip(&other.stress).enumerate() {
            *a = a.checked_add(*b).ok_or(CentralityError::StressOverflow {
                source_id: None,
                vertex: ids[slot],
            })?;
        }
        for (a, b) in self.betweenness.iter_mut().zip(&other.betweenness) {
            *a += b;
        }
        for (edge, c) in other.edge_betweenness {
            *self.edge_betweenness.entry(edge).or_insert(0.0) += c;
        }
        self.closeness.extend(other.closeness);
        self.average_path_length.extend(other.average_path_length);
        self.eccentricity.extend(other.eccentricity);
        add_histogram(&mut self.path_length_distribution, &other.path_length_distribution);
        add_histogram(&mut self.shared_neighbors, &other.shared_neighbors);
        self.skipped.extend(other.skipped);
        Ok(self)
    }

    fn into_closeness(self) -> ClosenessResult {
        ClosenessResult {
            closeness: self.closeness,
            average_path_length: self.average_path_length,
            eccentricity: self.eccentricity,
            path_length_distribution: self.path_length_distribution,
            shared_neighbors: self.shared_neighbors,
            skipped_sources: self.skipped,
        }
    }

    fn into_betweenness(self, ids: &[NodeId], undirected: bool) -> BetweennessResult {
        // Undirected sweeps see every pair from both ends.
        let (scale, stress_div) = if undirected { (0.5, 2) } else { (1.0, 1) };
        BetweennessResult {
            betweenness: ids
                .iter()
                .zip(&self.betweenness)
                .map(|(&v, &b)| (v, b * scale))
                .collect(),
            stress: ids
                .iter()
                .zip(&self.stress)
                .map(|(&v, &s)| (v, s / stress_div))
                .collect(),
            edge_betweenness: self
                .edge_betweenness
                .into_iter()
                .map(|(e, c)| (e, c * scale))
                .collect(),
            vertex_count: ids.len(),
            undirected,
            skipped_sources: self.skipped,
        }
    }
}

fn add_histogram(into: &mut BTreeMap<u64, u64>, from: &BTreeMap<u64, u64>) {
    for (&bucket, &count) in from {
        *into.entry(bucket).or_insert(0) += count;
    }
}

/// Shared-neighbor histogram for one source that reached `reached_targets`
/// other vertices. Only targets within two hops can share a neighbor with
/// the source; the rest are counted in bucket 0 without a lookup.
fn shared_neighbor_counts<G: GraphAccessor + ?Sized>(
    graph: &G,
    direction: TraversalDirection,
    source: NodeId,
    reached_targets: usize,
    buf: &mut Vec<Neighbor>,
) -> BTreeMap<u64, u64> {
    graph.neighbors(source, direction, buf);
    let source_neighbors: Vec<NodeId> = buf.iter().map(|nb| nb.vertex).collect();

    let mut near = source_neighbors.clone();
    for &a in &source_neighbors {
        graph.neighbors(a, direction, buf);
        near.extend(buf.iter().map(|nb| nb.vertex).filter(|&v| v != source));
    }
    near.sort_unstable();
    near.dedup();

    let mut hist = BTreeMap::new();
    for &t in &near {
        graph.neighbors(t, direction, buf);
        let shared = buf
            .iter()
            .filter(|nb| source_neighbors.binary_search(&nb.vertex).is_ok())
            .count() as u64;
        *hist.entry(shared).or_insert(0) += 1;
    }
    let far = reached_targets.saturating_sub(near.len());
    if far > 0 {
        *hist.entry(0).or_insert(0) += far as u64;
    }
    hist
}

/// Brandes backward pass over the run held in `state`.
///
/// For every predecessor link `p -> w` the share `σp/σw · (1 + δw)` is
/// added to `δp` and to the link's edge; `w`'s own dependency is final by
/// the time it is visited because all of its successors lie further from
/// the source.
fn accumulate(state: &mut SearchState, source_id: NodeId, run: &mut RunContribution) -> Result<()> {
    let Some(source) = state.source else {
        return Ok(());
    };
    let index = &state.index;

    for i in (0..state.order.len()).rev() {
        let w = state.order[i];
        let sigma_w = state.slots[w].path_count;
        let delta_w = state.slots[w].dependency;
        let sd_w = state.slots[w].stress_dependency;
        let through_w = sd_w.checked_add(1).ok_or(CentralityError::StressOverflow {
            source_id: Some(source_id),
            vertex: index.id(w),
        })?;

        for k in 0..state.slots[w].predecessors.len() {
            let link = state.slots[w].predecessors[k];
            let p = &mut state.slots[link.slot];
            let c = p.path_count as f64 / sigma_w as f64 * (1.0 + delta_w);
            p.dependency += c;
            p.stress_dependency =
                p.stress_dependency
                    .checked_add(through_w)
                    .ok_or(CentralityError::StressOverflow {
                        source_id: Some(source_id),
                        vertex: index.id(link.slot),
                    })?;
            run.edges.push((link.edge, c));
        }

        if w != source {
            let stress = sigma_w.checked_mul(sd_w).ok_or(CentralityError::StressOverflow {
                source_id: Some(source_id),
                vertex: index.id(w),
            })?;
            run.betweenness.push((w, delta_w));
            run.stress.push((w, stress));
        }
    }
    Ok(())
}

/// Reject weights the weighted search cannot handle before any run starts.
fn validate_weights<G: GraphAccessor + ?Sized>(
    graph: &G,
    engine: &TraversalEngine<'_, G>,
) -> Result<()> {
    let mut buf = Vec::new();
    for &v in engine.vertex_ids() {
        graph.neighbors(v, engine.direction(), &mut buf);
        for nb in &buf {
            check_weight(v, nb)?;
        }
    }
    Ok(())
}

struct Sweep<'a, 'g, G: ?Sized> {
    engine: &'a TraversalEngine<'g, G>,
    config: &'a CentralityConfig,
    wants: Wants,
    completed: AtomicUsize,
}

impl<G> Sweep<'_, '_, G>
where
    G: GraphAccessor + Sync + ?Sized,
{
    fn process(
        &self,
        source: NodeId,
        state: &mut SearchState,
        run: &mut RunContribution,
        totals: &mut Totals,
    ) -> Result<()> {
        let total = self.engine.vertex_count();
        if self.config.is_cancelled() {
            return Err(CentralityError::Cancelled {
                completed: self.completed.load(Ordering::Relaxed),
                total,
            });
        }

        match self.run_one(source, state, run, totals) {
            Ok(()) => {}
            Err(e) => match self.config.failure_policy {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::SkipSource => {
                    warn!(source, error = %e, "skipping source");
                    totals.skipped.push(SkippedSource {
                        source_id: source,
                        reason: e.to_string(),
                    });
                }
            },
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn run_one(
        &self,
        source: NodeId,
        state: &mut SearchState,
        run: &mut RunContribution,
        totals: &mut Totals,
    ) -> Result<()> {
        let summary = self.engine.run(source, self.config.mode, state)?;
        if self.wants.betweenness {
            run.clear();
            accumulate(state, source, run)?;
            totals.commit(&summary, run, self.engine.vertex_ids())?;
        }
        if self.wants.closeness {
            let mut buf = Vec::new();
            let shared = shared_neighbor_counts(
                self.engine.graph(),
                self.engine.direction(),
                source,
                summary.reached.saturating_sub(1),
                &mut buf,
            );
            totals.record_closeness(&summary, &shared);
        }
        debug!(source, reached = summary.reached, "source run complete");
        Ok(())
    }

    fn sequential(&self) -> Result<Totals> {
        let mut state = self.engine.new_state();
        let mut run = RunContribution::default();
        let mut totals = Totals::new(self.engine.vertex_count(), self.wants);
        for &source in self.engine.vertex_ids() {
            self.process(source, &mut state, &mut run, &mut totals)?;
        }
        Ok(totals)
    }

    fn parallel(&self) -> Result<Totals> {
        let n = self.engine.vertex_count();
        let ids = self.engine.vertex_ids();
        ids.par_iter()
            .try_fold(
                || {
                    (
                        self.engine.new_state(),
                        RunContribution::default(),
                        Totals::new(n, self.wants),
                    )
                },
                |(mut state, mut run, mut totals), &source| -> Result<(SearchState, RunContribution, Totals)> {
                    self.process(source, &mut state, &mut run, &mut totals)?;
                    Ok((state, run, totals))
                },
            )
            .map(|partial: Result<_>| partial.map(|(_, _, totals)| totals))
            .try_reduce(|| Totals::new(n, self.wants), |a, b| a.merge(b, ids))
    }
}

fn sweep<G>(graph: &G, config: &CentralityConfig, wants: Wants) -> Result<(Totals, Vec<NodeId>)>
where
    G: GraphAccessor + Sync + ?Sized,
{
    config.validate()?;
    debug!(
        vertices = graph.vertex_count(),
        mode = ?config.mode,
        direction = ?config.direction,
        "starting centrality sweep"
    );
    let engine = TraversalEngine::new(graph, config.direction);
    if config.mode == SearchMode::Dijkstra {
        validate_weights(graph, &engine)?;
    }

    let start = Instant::now();
    let driver = Sweep {
        engine: &engine,
        config,
        wants,
        completed: AtomicUsize::new(0),
    };

    let totals = if !config.parallel {
        driver.sequential()?
    } else if let Some(threads) = config.threads {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        pool.install(|| driver.parallel())?
    } else {
        driver.parallel()?
    };

    info!(
        sources = engine.vertex_count(),
        skipped = totals.skipped.len(),
        mode = ?config.mode,
        direction = ?config.direction,
        parallel = config.parallel,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "centrality sweep complete"
    );
    Ok((totals, engine.vertex_ids().to_vec()))
}
