//! Simulated QRNG: generation runs, entropy scoring and the QRNG metrics record.

use rand::Rng;
use serde::{Deserialize, Serialize};

use qshield_tests::{BATTERY_SIZE, TestResult};

/// Generation rate bounds, Gbps.
pub const MIN_RATE_GBPS: f64 = 0.5;
pub const MAX_RATE_GBPS: f64 = 10.0;
/// Largest rate change one generation run may cause, Gbps.
const RATE_JITTER_GBPS: f64 = 0.3;

/// QRNG status shown on the dashboard. Only user generation runs mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrngMetrics {
    /// Display form of `generation_gbps`.
    pub generation_rate: String,
    pub generation_gbps: f64,
    pub entropy_level: f64,
    pub randomness_tests_passed: u8,
    /// Bits generated so far.
    pub current_buffer: u64,
}

impl Default for QrngMetrics {
    fn default() -> Self {
        Self::with_rate(2.4, 0.9997, BATTERY_SIZE as u8, 1_048_576)
    }
}

impl QrngMetrics {
    pub fn with_rate(gbps: f64, entropy_level: f64, passed: u8, current_buffer: u64) -> Self {
        let gbps = if gbps.is_nan() {
            MIN_RATE_GBPS
        } else {
            gbps.clamp(MIN_RATE_GBPS, MAX_RATE_GBPS)
        };
        let entropy_level = if entropy_level.is_nan() {
            0.0
        } else {
            entropy_level.clamp(0.0, 1.0)
        };
        Self {
            generation_rate: format_rate(gbps),
            generation_gbps: gbps,
            entropy_level,
            randomness_tests_passed: passed.min(BATTERY_SIZE as u8),
            current_buffer,
        }
    }
}

impl QrngMetrics {
    /// Clamp every field into range and re-derive the display rate from `generation_gbps`.
    pub fn normalized(self) -> Self {
        Self::with_rate(
            self.generation_gbps,
            self.entropy_level,
            self.randomness_tests_passed,
            self.current_buffer,
        )
    }
}

pub fn format_rate(gbps: f64) -> String {
    format!("{gbps:.1} Gbps")
}

/// Binary Shannon entropy of the 0/1 bit counts, in `[0, 1]`.
///
/// A perfectly balanced stream scores 1.0; an all-zero or all-one stream 0.0.
pub fn binary_entropy(data: &[u8]) -> f64 {
    let total = data.len() as f64 * 8.0;
    if total == 0.0 {
        return 0.0;
    }
    let ones: u64 = data.iter().map(|b| b.count_ones() as u64).sum();
    let p = ones as f64 / total;
    [p, 1.0 - p]
        .into_iter()
        .filter(|&q| q > 0.0)
        .map(|q| -q * q.log2())
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Result of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationRun {
    pub bytes: Vec<u8>,
    pub results: Vec<TestResult>,
    pub metrics: QrngMetrics,
}

impl GenerationRun {
    pub fn passed(&self) -> usize {
        qshield_tests::passed_count(&self.results)
    }
}

/// Draw `sample_bytes` bytes, score them and derive the next metrics record.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    previous: &QrngMetrics,
    sample_bytes: usize,
) -> GenerationRun {
    let mut bytes = vec![0u8; sample_bytes];
    rng.fill(bytes.as_mut_slice());

    let results = qshield_tests::run_all(&bytes);
    let passed = qshield_tests::passed_count(&results);
    let gbps = previous.generation_gbps + rng.random_range(-RATE_JITTER_GBPS..=RATE_JITTER_GBPS);
    let bits = bytes.len() as u64 * 8;

    let metrics = QrngMetrics::with_rate(
        gbps,
        binary_entropy(&bytes),
        passed as u8,
        previous.current_buffer.saturating_add(bits),
    );
    log::debug!(
        "qrng run: {} bytes, entropy {:.4}, {passed}/{BATTERY_SIZE} passed",
        bytes.len(),
        metrics.entropy_level
    );
    GenerationRun {
        bytes,
        results,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn entropy_extremes() {
        assert_eq!(binary_entropy(&[]), 0.0);
        assert_eq!(binary_entropy(&[0u8; 64]), 0.0);
        assert_eq!(binary_entropy(&[0xFF; 64]), 0.0);
        assert!((binary_entropy(&[0x0F; 64]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn entropy_of_biased_stream() {
        // one bit in eight set: H(1/8)
        let h = binary_entropy(&[0x01; 100]);
        let expected = -(0.125f64 * 0.125f64.log2() + 0.875 * 0.875f64.log2());
        assert!((h - expected).abs() < 1e-12, "{h} vs {expected}");
    }

    #[test]
    fn generation_updates_every_field() {
        let mut rng = StdRng::seed_from_u64(11);
        let before = QrngMetrics::default();
        let run = generate(&mut rng, &before, 4096);
        assert_eq!(run.bytes.len(), 4096);
        assert_eq!(run.results.len(), BATTERY_SIZE);
        assert_eq!(run.metrics.current_buffer, before.current_buffer + 4096 * 8);
        assert!(run.metrics.entropy_level > 0.99);
        assert!(run.metrics.randomness_tests_passed >= 11, "{}", run.passed());
        assert!((run.metrics.generation_gbps - before.generation_gbps).abs() <= RATE_JITTER_GBPS);
        assert_eq!(run.metrics.generation_rate, format_rate(run.metrics.generation_gbps));
    }

    #[test]
    fn rate_is_clamped() {
        let m = QrngMetrics::with_rate(42.0, 2.0, 99, 0);
        assert_eq!(m.generation_gbps, MAX_RATE_GBPS);
        assert_eq!(m.entropy_level, 1.0);
        assert_eq!(m.randomness_tests_passed, BATTERY_SIZE as u8);
        assert_eq!(m.generation_rate, "10.0 Gbps");
    }
}
