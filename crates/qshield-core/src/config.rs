//! Dashboard configuration.
//!
//! Timer periods, random-walk magnitudes and buffer capacities are design
//! constants rather than requirements, so all of them live here with the
//! defaults the dashboard ships with. Every field is optional in the JSON form.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::notify;

/// Largest event or anomaly buffer a config may ask for.
pub const MAX_CAPACITY: usize = 10_000;

/// Per-field magnitude of one random-walk step (uniform in `[-m, +m]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkBounds {
    pub cpu_usage: i32,
    pub quantum_coherence: f64,
    pub network_latency: i32,
    pub security_score: i32,
}

impl Default for WalkBounds {
    fn default() -> Self {
        Self {
            cpu_usage: 5,
            quantum_coherence: 0.01,
            network_latency: 3,
            security_score: 2,
        }
    }
}

/// Shape of the synthetic AI anomaly score stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub baseline_min: f64,
    pub baseline_max: f64,
    pub spike_probability: f64,
    pub spike_min: f64,
    pub spike_max: f64,
    /// Initial alert threshold; the slider moves it at runtime.
    pub threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            baseline_min: 0.05,
            baseline_max: 0.35,
            spike_probability: 0.08,
            spike_min: 0.6,
            spike_max: 0.95,
            threshold: 0.7,
        }
    }
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub mutation_period_ms: u64,
    pub chart_period_ms: u64,
    pub event_period_ms: u64,
    pub notification_ttl_ms: u64,
    pub walk: WalkBounds,
    pub event_capacity: usize,
    pub anomaly_capacity: usize,
    pub anomaly: AnomalyConfig,
    /// Bytes drawn per QRNG generation.
    pub qrng_sample_bytes: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            mutation_period_ms: 5_000,
            chart_period_ms: 2_000,
            event_period_ms: 15_000,
            notification_ttl_ms: 3_000,
            walk: WalkBounds::default(),
            event_capacity: 10,
            anomaly_capacity: 10,
            anomaly: AnomalyConfig::default(),
            qrng_sample_bytes: 4096,
        }
    }
}

impl DashboardConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("loaded dashboard config from {}", path.display());
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("mutation_period_ms", self.mutation_period_ms),
            ("chart_period_ms", self.chart_period_ms),
            ("event_period_ms", self.event_period_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        let capacities = [
            ("event_capacity", self.event_capacity),
            ("anomaly_capacity", self.anomaly_capacity),
        ];
        for (name, value) in capacities {
            if value == 0 || value > MAX_CAPACITY {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be in 1..={MAX_CAPACITY}"
                )));
            }
        }
        if self.notification_ttl() > notify::MAX_TTL {
            return Err(Error::InvalidConfig(format!(
                "notification_ttl_ms must be <= {}",
                notify::MAX_TTL.as_millis()
            )));
        }
        if self.qrng_sample_bytes == 0 {
            return Err(Error::InvalidConfig("qrng_sample_bytes must be > 0".into()));
        }
        let w = &self.walk;
        if w.cpu_usage < 0 || w.network_latency < 0 || w.security_score < 0 {
            return Err(Error::InvalidConfig("walk magnitudes must be >= 0".into()));
        }
        if !(w.quantum_coherence >= 0.0 && w.quantum_coherence.is_finite()) {
            return Err(Error::InvalidConfig(
                "walk.quantum_coherence must be finite and >= 0".into(),
            ));
        }
        let a = &self.anomaly;
        if !(0.0..=1.0).contains(&a.threshold) {
            return Err(Error::InvalidConfig("anomaly.threshold must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&a.spike_probability) {
            return Err(Error::InvalidConfig(
                "anomaly.spike_probability must be in [0, 1]".into(),
            ));
        }
        if a.baseline_min > a.baseline_max || a.spike_min > a.spike_max {
            return Err(Error::InvalidConfig("anomaly ranges are inverted".into()));
        }
        Ok(())
    }

    pub fn mutation_period(&self) -> Duration {
        Duration::from_millis(self.mutation_period_ms)
    }

    pub fn chart_period(&self) -> Duration {
        Duration::from_millis(self.chart_period_ms)
    }

    pub fn event_period(&self) -> Duration {
        Duration::from_millis(self.event_period_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DashboardConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{ "mutation_period_ms": 250, "walk": { "cpu_usage": 9 } }"#)
                .unwrap();
        assert_eq!(config.mutation_period_ms, 250);
        assert_eq!(config.walk.cpu_usage, 9);
        assert_eq!(config.walk.network_latency, 3);
        assert_eq!(config.event_capacity, 10);
    }

    #[test]
    fn zero_period_rejected() {
        let config = DashboardConfig {
            chart_period_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chart_period_ms"), "{err}");
    }

    #[test]
    fn inverted_anomaly_range_rejected() {
        let mut config = DashboardConfig::default();
        config.anomaly.baseline_min = 0.9;
        config.anomaly.baseline_max = 0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_capacity_rejected() {
        let config = DashboardConfig {
            event_capacity: usize::MAX,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("event_capacity"), "{err}");

        let config = DashboardConfig {
            anomaly_capacity: MAX_CAPACITY + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            anomaly_capacity: MAX_CAPACITY,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn oversized_notification_ttl_rejected() {
        let config = DashboardConfig {
            notification_ttl_ms: 9_000_000_000_000_000,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("notification_ttl_ms"), "{err}");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, r#"{ "event_period_ms": 1000, "event_capacity": 4 }"#).unwrap();
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.event_period(), Duration::from_secs(1));
        assert_eq!(config.event_capacity, 4);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = DashboardConfig::load("/nonexistent/qshield.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
