use std::collections::VecDeque;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use graph_centrality_core::{
    compute_all, compute_betweenness, compute_closeness, CentralityConfig, Graph, NodeId,
    SearchMode, TraversalDirection,
};
use serde::Serialize;
use tracing::info;

/// Time closeness and betweenness centrality across generated topologies.
#[derive(Parser, Debug)]
#[command(name = "graph-centrality-bench", version, about, long_about = None)]
struct Cli {
    /// Graph generator to benchmark
    #[arg(value_enum, default_value_t = Topology::All)]
    topology: Topology,

    /// Number of vertices per generated graph
    #[arg(
        default_value_t = 2_000,
        env = "CENTRALITY_NODE_COUNT",
        value_parser = clap::value_parser!(u64).range(16..)
    )]
    node_count: u64,

    /// Traversal used by every source run
    #[arg(long, value_enum, default_value_t = ModeArg::Bfs, env = "CENTRALITY_MODE")]
    search_mode: ModeArg,

    /// Which stored edges are followed
    #[arg(long, value_enum, default_value_t = DirectionArg::Both, env = "CENTRALITY_DIRECTION")]
    direction: DirectionArg,

    /// Worker threads (default: rayon's choice)
    #[arg(long, env = "CENTRALITY_THREADS")]
    threads: Option<usize>,

    /// Process sources on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Print one JSON summary line per topology
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Topology {
    /// Run all generators (default)
    All,
    /// Fractal branching tree (deep paths)
    Lsystem,
    /// Preferential attachment via edge sampling (hub-and-spoke)
    Scalefree,
    /// Watts-Strogatz ring lattice + shortcuts
    Smallworld,
    /// Erdos-Renyi uniform random edges
    Random,
    /// Two dense cliques connected by a thin bridge
    Barbell,
    /// Diffusion-limited aggregation (organic branching)
    Dla,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    Bfs,
    Dijkstra,
}

impl From<ModeArg> for SearchMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Bfs => SearchMode::Bfs,
            ModeArg::Dijkstra => SearchMode::Dijkstra,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DirectionArg {
    Outgoing,
    Incoming,
    Both,
}

impl From<DirectionArg> for TraversalDirection {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Outgoing => TraversalDirection::Outgoing,
            DirectionArg::Incoming => TraversalDirection::Incoming,
            DirectionArg::Both => TraversalDirection::Both,
        }
    }
}

#[derive(Debug, Serialize)]
struct BenchSummary<'a> {
    topology: &'a str,
    nodes: usize,
    edges: usize,
    mode: SearchMode,
    direction: TraversalDirection,
    closeness_ms: f64,
    betweenness_ms: f64,
    combined_ms: f64,
    mean_closeness: f64,
    top_betweenness: Vec<(NodeId, f64)>,
    skipped_sources: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = CentralityConfig::new()
        .with_mode(cli.search_mode.into())
        .with_direction(cli.direction.into())
        .with_parallel(!cli.sequential);
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }
    config.validate().context("invalid benchmark configuration")?;

    let generators: Vec<(&str, fn(u64) -> Graph)> = match cli.topology {
        Topology::Lsystem => vec![("L-system tree", gen_lsystem)],
        Topology::Scalefree => vec![("Scale-free (edge sampling)", gen_scale_free)],
        Topology::Smallworld => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        Topology::Random => vec![("Erdos-Renyi random", gen_random)],
        Topology::Barbell => vec![("Barbell (clique-bridge-clique)", gen_barbell)],
        Topology::Dla => vec![("DLA (organic branching)", gen_dla)],
        Topology::All => vec![
            ("L-system tree", gen_lsystem as fn(u64) -> Graph),
            ("Scale-free (edge sampling)", gen_scale_free),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("Barbell (clique-bridge-clique)", gen_barbell),
            ("DLA (organic branching)", gen_dla),
        ],
    };

    if !cli.json {
        println!("graph-centrality-bench");
        println!("======================");
        println!();
    }

    for (name, generator) in generators {
        let summary = run_benchmark(name, generator, cli.node_count, &config, !cli.json)?;
        if cli.json {
            println!("{}", serde_json::to_string(&summary)?);
        }
    }
    Ok(())
}

fn millis(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

fn run_benchmark<'a>(
    name: &'a str,
    generator: fn(u64) -> Graph,
    node_count: u64,
    config: &CentralityConfig,
    table: bool,
) -> Result<BenchSummary<'a>> {
    let t = Instant::now();
    let graph = generator(node_count);
    info!(
        topology = name,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        elapsed_ms = millis(t),
        "generated graph"
    );

    let t = Instant::now();
    let closeness = compute_closeness(&graph, config)
        .with_context(|| format!("closeness on {name}"))?;
    let closeness_ms = millis(t);

    let t = Instant::now();
    let betweenness = compute_betweenness(&graph, config)
        .with_context(|| format!("betweenness on {name}"))?;
    let betweenness_ms = millis(t);

    let t = Instant::now();
    let combined = compute_all(&graph, config).with_context(|| format!("combined sweep on {name}"))?;
    let combined_ms = millis(t);

    let mean_closeness = if closeness.closeness.is_empty() {
        0.0
    } else {
        closeness.closeness.values().sum::<f64>() / closeness.closeness.len() as f64
    };

    let mut ranked: Vec<(NodeId, f64)> = betweenness
        .betweenness
        .iter()
        .map(|(&v, &b)| (v, b))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(5);

    if table {
        println!("--- {} ---", name);
        println!(
            "{} nodes, {} edges, ~{:.1}MB",
            graph.node_count(),
            graph.edge_count(),
            graph.memory_usage() as f64 / 1_048_576.0
        );
        println!();
        println!("{:>14} {:>12}", "measure", "time");
        println!("{:->14} {:->12}", "", "");
        println!("{:>14} {:>10.1}ms", "closeness", closeness_ms);
        println!("{:>14} {:>10.1}ms", "betweenness", betweenness_ms);
        println!("{:>14} {:>10.1}ms", "combined", combined_ms);
        println!();
        println!("mean closeness: {:.4}", mean_closeness);
        println!("top betweenness (normalized):");
        let normalized = betweenness.normalized();
        for (v, b) in &ranked {
            println!(
                "{:>10} {:>14.1} {:>8.4}",
                v,
                b,
                normalized.get(v).copied().unwrap_or(0.0)
            );
        }
        println!();
    }

    Ok(BenchSummary {
        topology: name,
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        mode: config.mode,
        direction: config.direction,
        closeness_ms,
        betweenness_ms,
        combined_ms,
        mean_closeness,
        top_betweenness: ranked,
        skipped_sources: combined.closeness.skipped_sources.len(),
    })
}

// ---------------------------------------------------------------------------
// Generators: O(n) or O(n + edges), single-threaded, deterministic.
// Edge weights are small integers so Dijkstra runs see real ties.
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
    /// Edge weight in 1..=4.
    fn weight(&mut self) -> f64 {
        (1 + self.next(4)) as f64
    }
}

/// L-system fractal tree: deep branching with self-similar structure.
///
/// Each node spawns `branching` children. Every vertex except the root is
/// a cut vertex for its subtree, so betweenness concentrates near the root.
fn gen_lsystem(node_count: u64) -> Graph {
    let mut graph = Graph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(42);

    let branching = 3u64;
    graph.add_node(0);
    let mut next_id: u64 = 1;
    let mut frontier: Vec<u64> = vec![0];

    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * branching as usize);
        for &parent in &frontier {
            for _ in 0..branching {
                if next_id >= node_count {
                    break;
                }
                let child = next_id;
                next_id += 1;
                graph.add_edge(parent, child, rng.weight());
                next_frontier.push(child);
            }
        }
        frontier = next_frontier;
    }

    graph
}

/// Scale-free via edge-list sampling (O(edges), not O(n²)).
///
/// Preferential attachment by picking a random existing edge and connecting
/// to one of its endpoints. Nodes with more edges are more likely to be picked.
fn gen_scale_free(node_count: u64) -> Graph {
    let edges_per_node = 4u64;
    let mut graph = Graph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(12345);

    let mut edge_endpoints: Vec<u64> = Vec::with_capacity((node_count * edges_per_node * 2) as usize);

    // Seed: small clique
    let seed = 5u64;
    for i in 0..seed {
        for j in (i + 1)..seed {
            graph.add_edge(i, j, rng.weight());
            edge_endpoints.push(i);
            edge_endpoints.push(j);
        }
    }

    for new_node in seed..node_count {
        graph.add_node(new_node);
        let attach = edges_per_node.min(new_node);
        for _ in 0..attach {
            let idx = rng.next(edge_endpoints.len() as u64) as usize;
            let target = edge_endpoints[idx];
            if target != new_node {
                graph.add_edge(new_node, target, rng.weight());
                edge_endpoints.push(new_node);
                edge_endpoints.push(target);
            }
        }
    }

    graph
}

/// Small-world (Watts-Strogatz): ring lattice + random rewiring.
///
/// High clustering with short path lengths; a handful of shortcuts carry
/// most of the betweenness.
fn gen_small_world(node_count: u64) -> Graph {
    let k = 3u64; // neighbors on each side
    let p = 0.05f64; // rewire probability
    let mut graph = Graph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(67890);

    for i in 0..node_count {
        graph.add_node(i);
    }

    // Forward direction only to avoid double edges.
    for i in 0..node_count {
        for j in 1..=k {
            let neighbor = (i + j) % node_count;
            let w = rng.weight();
            if rng.next_f64() < p {
                let rewired = rng.next(node_count);
                graph.add_edge(i, if rewired != i { rewired } else { neighbor }, w);
            } else {
                graph.add_edge(i, neighbor, w);
            }
        }
    }

    graph
}

/// Erdos-Renyi: uniform random edges, ~4 per node. Baseline topology with
/// no structure.
fn gen_random(node_count: u64) -> Graph {
    let target_edges = node_count * 4;
    let mut graph = Graph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(54321);

    for i in 0..node_count {
        graph.add_node(i);
    }

    for _ in 0..target_edges {
        let from = rng.next(node_count);
        let to = rng.next(node_count);
        if from != to {
            graph.add_edge(from, to, rng.weight());
        }
    }

    graph
}

/// Barbell: two dense cliques connected by a single thin bridge.
///
/// Every cross-clique shortest path runs through the bridge, which should
/// dominate the betweenness ranking.
fn gen_barbell(node_count: u64) -> Graph {
    let bridge_len = 10u64;
    let clique_size = node_count.saturating_sub(bridge_len) / 2;
    let degree = 8u64.min(clique_size.saturating_sub(1));
    let mut graph = Graph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(99999);

    let mut clique = |graph: &mut Graph, start: u64| {
        for i in 0..clique_size {
            graph.add_node(start + i);
        }
        for i in 0..clique_size {
            for _ in 0..degree {
                let target = rng.next(clique_size);
                if target != i {
                    let w = rng.weight();
                    graph.add_edge(start + i, start + target, w);
                }
            }
        }
    };

    // Clique A, then the bridge chain, then clique B.
    clique(&mut graph, 0);
    let bridge_start = clique_size;
    for i in 0..bridge_len {
        let id = bridge_start + i;
        let from = if i == 0 { clique_size.saturating_sub(1) } else { id - 1 };
        graph.add_edge(from, id, 1.0);
    }
    let b_start = bridge_start + bridge_len;
    clique(&mut graph, b_start);
    graph.add_edge(b_start - 1, b_start, 1.0);

    graph
}

/// DLA (Diffusion-Limited Aggregation): organic branching growth.
///
/// Simplified: each new node attaches to a random recent "surface" node,
/// with occasional long-range jumps that create loops.
fn gen_dla(node_count: u64) -> Graph {
    let mut graph = Graph::with_capacity(node_count as usize);
    let mut rng = FastRng::new(77777);

    graph.add_node(0);

    // Recent additions only, so growth stays at the frontier.
    let surface_max = 1000usize;
    let mut surface: VecDeque<u64> = VecDeque::with_capacity(surface_max + 1);
    surface.push_back(0);

    for new_node in 1..node_count {
        let attach_to = surface[rng.next(surface.len() as u64) as usize];
        graph.add_edge(new_node, attach_to, rng.weight());

        // 10% chance of a second connection
        if rng.next(10) == 0 && new_node > 1 {
            let other = rng.next(new_node);
            if other != attach_to {
                graph.add_edge(new_node, other, rng.weight());
            }
        }

        surface.push_back(new_node);
        if surface.len() > surface_max {
            surface.pop_front();
        }
    }

    graph
}
