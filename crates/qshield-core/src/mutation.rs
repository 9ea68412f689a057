//! Metric mutation engine.
//!
//! Each tick asks a [`DeltaSource`] for one perturbation and hands it to the
//! [`MetricsStore`], which clamps. The default source is a uniform bounded
//! random walk; tests script the deltas instead.

use std::collections::VecDeque;

use rand::Rng;
use rand::rngs::StdRng;

use crate::config::WalkBounds;
use crate::metrics::{MetricsDelta, MetricsSnapshot, MetricsStore};

/// Produces the next delta to apply.
pub trait DeltaSource: Send {
    fn next_delta(&mut self, current: &MetricsSnapshot) -> MetricsDelta;
}

/// Uniform offsets in `[-m, +m]` per field.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: StdRng,
    bounds: WalkBounds,
}

impl RandomWalk {
    pub fn new(rng: StdRng, bounds: WalkBounds) -> Self {
        Self { rng, bounds }
    }
}

impl DeltaSource for RandomWalk {
    fn next_delta(&mut self, _current: &MetricsSnapshot) -> MetricsDelta {
        let b = &self.bounds;
        MetricsDelta {
            cpu_usage: self.rng.random_range(-b.cpu_usage..=b.cpu_usage),
            quantum_coherence: self
                .rng
                .random_range(-b.quantum_coherence..=b.quantum_coherence),
            network_latency: self.rng.random_range(-b.network_latency..=b.network_latency),
            security_score: self.rng.random_range(-b.security_score..=b.security_score),
        }
    }
}

/// Replays a fixed list of deltas, then yields zero deltas.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDeltas {
    deltas: VecDeque<MetricsDelta>,
}

impl ScriptedDeltas {
    pub fn new(deltas: impl IntoIterator<Item = MetricsDelta>) -> Self {
        Self {
            deltas: deltas.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.deltas.len()
    }
}

impl DeltaSource for ScriptedDeltas {
    fn next_delta(&mut self, _current: &MetricsSnapshot) -> MetricsDelta {
        self.deltas.pop_front().unwrap_or_default()
    }
}

pub struct MutationEngine {
    source: Box<dyn DeltaSource>,
    ticks: u64,
}

impl MutationEngine {
    pub fn new(source: Box<dyn DeltaSource>) -> Self {
        Self { source, ticks: 0 }
    }

    /// Read, perturb, write. Returns the new snapshot.
    pub fn tick(&mut self, store: &mut MetricsStore) -> MetricsSnapshot {
        let current = store.snapshot();
        let delta = self.source.next_delta(&current);
        self.ticks += 1;
        store.apply_delta(&delta)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl std::fmt::Debug for MutationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationEngine")
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn scripted_engine_walks_cpu() {
        let mut store = MetricsStore::new(MetricsSnapshot::default());
        let mut engine = MutationEngine::new(Box::new(ScriptedDeltas::new(
            [5, -5, 5].map(MetricsDelta::cpu),
        )));
        let cpu: Vec<u8> = (0..3).map(|_| engine.tick(&mut store).cpu_usage).collect();
        assert_eq!(cpu, vec![72, 67, 72]);
        assert_eq!(engine.ticks(), 3);
        // script exhausted: zero deltas
        assert_eq!(engine.tick(&mut store).cpu_usage, 72);
    }

    #[test]
    fn random_walk_respects_magnitudes() {
        let bounds = WalkBounds::default();
        let mut walk = RandomWalk::new(StdRng::seed_from_u64(3), bounds);
        let snapshot = MetricsSnapshot::default();
        for _ in 0..1_000 {
            let d = walk.next_delta(&snapshot);
            assert!(d.cpu_usage.abs() <= bounds.cpu_usage);
            assert!(d.quantum_coherence.abs() <= bounds.quantum_coherence);
            assert!(d.network_latency.abs() <= bounds.network_latency);
            assert!(d.security_score.abs() <= bounds.security_score);
        }
    }

    #[test]
    fn long_random_walk_stays_in_bounds() {
        let bounds = WalkBounds {
            cpu_usage: 60,
            quantum_coherence: 0.8,
            network_latency: 40,
            security_score: 30,
        };
        let mut store = MetricsStore::new(MetricsSnapshot::default());
        let mut engine =
            MutationEngine::new(Box::new(RandomWalk::new(StdRng::seed_from_u64(9), bounds)));
        for _ in 0..2_000 {
            let s = engine.tick(&mut store);
            assert!(s.in_bounds(), "{s:?}");
        }
    }

    #[test]
    fn zero_magnitude_walk_is_stationary() {
        let bounds = WalkBounds {
            cpu_usage: 0,
            quantum_coherence: 0.0,
            network_latency: 0,
            security_score: 0,
        };
        let mut store = MetricsStore::new(MetricsSnapshot::default());
        let mut engine =
            MutationEngine::new(Box::new(RandomWalk::new(StdRng::seed_from_u64(0), bounds)));
        assert_eq!(engine.tick(&mut store), MetricsSnapshot::default());
    }
}
