use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::SearchMode;
use crate::error::{CentralityError, Result};
use crate::graph::TraversalDirection;

/// Upper bound for an explicit worker count.
pub const MAX_THREADS: usize = 1024;

/// What to do when a single source run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole computation with the run's error.
    #[default]
    Abort,
    /// Drop the source's contribution, record it in `skipped_sources`,
    /// and continue.
    SkipSource,
}

/// Cooperative cancellation flag, checked between source runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Settings for one centrality computation.
///
/// | field            | default    | bounds            |
/// |------------------|------------|-------------------|
/// | `mode`           | `Bfs`      | `Bfs`, `Dijkstra` |
/// | `direction`      | `Both`     |                   |
/// | `parallel`       | `true`     |                   |
/// | `threads`        | rayon's    | `1..=1024`        |
/// | `failure_policy` | `Abort`    |                   |
#[derive(Debug, Clone)]
pub struct CentralityConfig {
    pub mode: SearchMode,
    pub direction: TraversalDirection,
    pub parallel: bool,
    /// `None` runs on rayon's global pool.
    pub threads: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub cancellation: Option<CancellationToken>,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            direction: TraversalDirection::default(),
            parallel: true,
            threads: None,
            failure_policy: FailurePolicy::default(),
            cancellation: None,
        }
    }
}

impl CentralityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_direction(mut self, direction: TraversalDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mode.is_shortest_path() {
            return Err(CentralityError::UnsupportedMode(self.mode));
        }
        if let Some(threads) = self.threads {
            if threads == 0 || threads > MAX_THREADS {
                return Err(CentralityError::InvalidConfig(format!(
                    "threads must be in 1..={MAX_THREADS}, got {threads}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|t| t.is_cancelled())
    }
}
