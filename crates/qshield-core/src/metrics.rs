//! Metrics store: the scalar system snapshot and its bounded random walk.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Valid CPU usage, percent.
pub const CPU_USAGE: RangeInclusive<i64> = 0..=100;
/// Valid quantum coherence.
pub const QUANTUM_COHERENCE: RangeInclusive<f64> = 0.0..=1.0;
/// Valid network latency, milliseconds.
pub const NETWORK_LATENCY: RangeInclusive<i64> = 5..=30;
/// Valid security score.
pub const SECURITY_SCORE: RangeInclusive<i64> = 90..=100;

/// Current scalar system state. Replaced wholesale on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cpu_usage: u8,
    pub quantum_coherence: f64,
    pub network_latency: u32,
    pub security_score: u8,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            cpu_usage: 67,
            quantum_coherence: 0.987,
            network_latency: 12,
            security_score: 98,
        }
    }
}

/// Signed perturbation for every field of a [`MetricsSnapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsDelta {
    pub cpu_usage: i32,
    pub quantum_coherence: f64,
    pub network_latency: i32,
    pub security_score: i32,
}

impl MetricsDelta {
    /// Delta touching only `cpu_usage`.
    pub fn cpu(step: i32) -> Self {
        Self {
            cpu_usage: step,
            ..Self::default()
        }
    }
}

fn clamp_int(value: i64, range: &RangeInclusive<i64>) -> i64 {
    value.clamp(*range.start(), *range.end())
}

fn clamp_coherence(value: f64) -> f64 {
    if value.is_nan() {
        return *QUANTUM_COHERENCE.start();
    }
    value.clamp(*QUANTUM_COHERENCE.start(), *QUANTUM_COHERENCE.end())
}

impl MetricsSnapshot {
    /// Bring every field back inside its interval.
    pub fn clamped(self) -> Self {
        Self {
            cpu_usage: clamp_int(self.cpu_usage as i64, &CPU_USAGE) as u8,
            quantum_coherence: clamp_coherence(self.quantum_coherence),
            network_latency: clamp_int(self.network_latency as i64, &NETWORK_LATENCY) as u32,
            security_score: clamp_int(self.security_score as i64, &SECURITY_SCORE) as u8,
        }
    }

    /// Add `delta` field by field, clamping each result to its interval.
    pub fn apply(self, delta: &MetricsDelta) -> Self {
        let coherence_step = if delta.quantum_coherence.is_finite() {
            delta.quantum_coherence
        } else {
            0.0
        };
        Self {
            cpu_usage: clamp_int(self.cpu_usage as i64 + delta.cpu_usage as i64, &CPU_USAGE) as u8,
            quantum_coherence: clamp_coherence(self.quantum_coherence + coherence_step),
            network_latency: clamp_int(
                self.network_latency as i64 + delta.network_latency as i64,
                &NETWORK_LATENCY,
            ) as u32,
            security_score: clamp_int(
                self.security_score as i64 + delta.security_score as i64,
                &SECURITY_SCORE,
            ) as u8,
        }
    }

    pub fn in_bounds(&self) -> bool {
        CPU_USAGE.contains(&(self.cpu_usage as i64))
            && QUANTUM_COHERENCE.contains(&self.quantum_coherence)
            && NETWORK_LATENCY.contains(&(self.network_latency as i64))
            && SECURITY_SCORE.contains(&(self.security_score as i64))
    }
}

/// Single-writer owner of the live [`MetricsSnapshot`].
#[derive(Debug, Clone)]
pub struct MetricsStore {
    current: MetricsSnapshot,
}

impl MetricsStore {
    /// Seed values outside their intervals are clamped on entry.
    pub fn new(seed: MetricsSnapshot) -> Self {
        Self {
            current: seed.clamped(),
        }
    }

    /// Read-only copy of the current snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.current
    }

    /// Replace the snapshot with `current + delta` (clamped) and return it.
    pub fn apply_delta(&mut self, delta: &MetricsDelta) -> MetricsSnapshot {
        self.current = self.current.apply(delta);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_clamped_to_interval() {
        let mut store = MetricsStore::new(MetricsSnapshot::default());
        let s = store.apply_delta(&MetricsDelta {
            cpu_usage: 1_000,
            quantum_coherence: 5.0,
            network_latency: -1_000,
            security_score: i32::MAX,
        });
        assert_eq!(s.cpu_usage, 100);
        assert_eq!(s.quantum_coherence, 1.0);
        assert_eq!(s.network_latency, 5);
        assert_eq!(s.security_score, 100);

        let s = store.apply_delta(&MetricsDelta {
            cpu_usage: i32::MIN,
            quantum_coherence: f64::NEG_INFINITY,
            network_latency: i32::MAX,
            security_score: i32::MIN,
        });
        assert_eq!(s.cpu_usage, 0);
        // non-finite steps are ignored rather than poisoning the value
        assert_eq!(s.quantum_coherence, 1.0);
        assert_eq!(s.network_latency, 30);
        assert_eq!(s.security_score, 90);
        assert!(s.in_bounds());
    }

    #[test]
    fn scripted_cpu_walk_matches_expected_sequence() {
        let mut store = MetricsStore::new(MetricsSnapshot {
            cpu_usage: 67,
            ..MetricsSnapshot::default()
        });
        let seen: Vec<u8> = [5, -5, 5]
            .into_iter()
            .map(|step| store.apply_delta(&MetricsDelta::cpu(step)).cpu_usage)
            .collect();
        assert_eq!(seen, vec![72, 67, 72]);
    }

    #[test]
    fn out_of_range_seed_is_clamped() {
        let store = MetricsStore::new(MetricsSnapshot {
            cpu_usage: 250,
            quantum_coherence: f64::NAN,
            network_latency: 1,
            security_score: 12,
        });
        let s = store.snapshot();
        assert!(s.in_bounds(), "{s:?}");
        assert_eq!(s.network_latency, 5);
        assert_eq!(s.security_score, 90);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut store = MetricsStore::new(MetricsSnapshot::default());
        let before = store.snapshot();
        store.apply_delta(&MetricsDelta::cpu(-10));
        assert_eq!(before.cpu_usage, 67);
        assert_eq!(store.snapshot().cpu_usage, 57);
    }
}
