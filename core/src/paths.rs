use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Shortest-path length statistics for one source run.
///
/// `record` is called once for every vertex finalized by the run other than
/// the source itself, so `count` is the number of reachable targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathLengthData {
    count: u64,
    sum: f64,
    max: f64,
    /// Number of targets per length bucket; bucket `k` holds lengths in
    /// `[k, k + 1)`, which is exact for hop counts.
    histogram: BTreeMap<u64, u64>,
}

impl PathLengthData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, distance: f64) {
        self.count += 1;
        self.sum += distance;
        if distance > self.max {
            self.max = distance;
        }
        *self.histogram.entry(distance.floor() as u64).or_insert(0) += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Average shortest-path length, 0 for a source that reaches nothing.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Eccentricity of the source over the vertices it reaches.
    pub fn max_length(&self) -> f64 {
        self.max
    }

    pub fn histogram(&self) -> &BTreeMap<u64, u64> {
        &self.histogram
    }

    /// Closeness of the source: inverse average path length, 0 when the
    /// source reaches nothing.
    pub fn closeness(&self) -> f64 {
        let average = self.average();
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.sum = 0.0;
        self.max = 0.0;
        self.histogram.clear();
    }
}
