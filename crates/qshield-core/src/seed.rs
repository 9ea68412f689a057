//! Static seed dataset consumed once at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::MetricsSnapshot;
use crate::network::{DefensePlatform, PlatformStatus, Protocol};
use crate::qrng::QrngMetrics;
use crate::series::SeriesPoint;
use crate::threat::{PlatformKind, Severity, ThreatEvent, ThreatStatus, ThreatType};

/// Initial rows for each chart-backed series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSeries {
    pub entropy: Vec<SeriesPoint>,
    pub detection: Vec<SeriesPoint>,
    pub performance: Vec<SeriesPoint>,
    pub anomaly: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub metrics: MetricsSnapshot,
    pub qrng: QrngMetrics,
    pub protocols: Vec<Protocol>,
    pub platforms: Vec<DefensePlatform>,
    /// Newest first.
    pub threats: Vec<ThreatEvent>,
    pub series: SeedSeries,
}

impl Default for SeedData {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SeedData {
    /// Dataset bundled with the dashboard.
    pub fn builtin() -> Self {
        Self {
            metrics: MetricsSnapshot::default(),
            qrng: QrngMetrics::default(),
            protocols: vec![
                protocol("E91", 2.4, 0.018, "Active"),
                protocol("BB84", 3.1, 0.021, "Active"),
                protocol("B92", 1.7, 0.034, "Standby"),
                protocol("CV-QKD", 5.6, 0.047, "Active"),
            ],
            platforms: vec![
                platform(
                    "SAT-01 Sentinel",
                    PlatformKind::Satellite,
                    PlatformStatus::Secure,
                    "QKD / E91",
                    true,
                ),
                platform(
                    "Naval Group Echo",
                    PlatformKind::Naval,
                    PlatformStatus::Secure,
                    "QKD / BB84",
                    true,
                ),
                platform(
                    "AEW Falcon",
                    PlatformKind::Airborne,
                    PlatformStatus::Monitoring,
                    "RF + QKD relay",
                    false,
                ),
                platform(
                    "Command Post Alpha",
                    PlatformKind::Ground,
                    PlatformStatus::Secure,
                    "Fiber QKD / BB84",
                    true,
                ),
            ],
            threats: vec![
                threat(
                    "2026-01-15 14:32:07",
                    ThreatType::QuantumInterception,
                    PlatformKind::Satellite,
                    Severity::High,
                    ThreatStatus::Blocked,
                ),
                threat(
                    "2026-01-15 14:28:41",
                    ThreatType::SignalJamming,
                    PlatformKind::Naval,
                    Severity::Medium,
                    ThreatStatus::Investigating,
                ),
                threat(
                    "2026-01-15 14:21:15",
                    ThreatType::ManInTheMiddle,
                    PlatformKind::Ground,
                    Severity::High,
                    ThreatStatus::Neutralized,
                ),
                threat(
                    "2026-01-15 14:09:52",
                    ThreatType::Eavesdropping,
                    PlatformKind::Airborne,
                    Severity::Low,
                    ThreatStatus::Monitoring,
                ),
                threat(
                    "2026-01-15 13:55:30",
                    ThreatType::CyberIntrusion,
                    PlatformKind::Ground,
                    Severity::Medium,
                    ThreatStatus::Blocked,
                ),
            ],
            series: SeedSeries {
                entropy: points(
                    ["G#1", "G#2", "G#3", "G#4", "G#5", "G#6", "G#7", "G#8"],
                    [
                        [0.9996], [0.9998], [0.9997], [0.9999],
                        [0.9995], [0.9998], [0.9997], [0.9998],
                    ],
                ),
                detection: points(
                    ["08:00", "09:00", "10:00", "11:00", "12:00", "13:00"],
                    [[4.0, 4.0], [7.0, 6.0], [3.0, 3.0], [9.0, 8.0], [5.0, 5.0], [6.0, 5.0]],
                ),
                performance: points(
                    ["08:00", "09:00", "10:00", "11:00", "12:00", "13:00"],
                    [
                        [58.0, 14.0], [63.0, 12.0], [71.0, 15.0],
                        [66.0, 11.0], [69.0, 13.0], [67.0, 12.0],
                    ],
                ),
                anomaly: points(
                    ["T-9", "T-8", "T-7", "T-6", "T-5", "T-4", "T-3", "T-2", "T-1", "T-0"],
                    [
                        [0.12, 0.7], [0.18, 0.7], [0.09, 0.7], [0.22, 0.7], [0.15, 0.7],
                        [0.31, 0.7], [0.11, 0.7], [0.19, 0.7], [0.14, 0.7], [0.21, 0.7],
                    ],
                ),
            },
        }
    }

    /// Read a replacement dataset from JSON. Out-of-range scalars are clamped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let raw: Self = serde_json::from_str(&text)?;
        let seed = raw.clone().normalized();
        if seed != raw {
            log::warn!("seed data in {} had out-of-range metrics; clamped", path.display());
        }
        log::info!(
            "loaded seed data from {} ({} platforms, {} threats)",
            path.display(),
            seed.platforms.len(),
            seed.threats.len()
        );
        Ok(seed)
    }

    /// Bring the scalar metrics and the QRNG record inside their intervals.
    pub fn normalized(mut self) -> Self {
        self.metrics = self.metrics.clamped();
        self.qrng = self.qrng.normalized();
        self
    }
}

fn protocol(name: &str, key_rate_kbps: f64, qber: f64, status: &str) -> Protocol {
    Protocol {
        name: name.to_string(),
        key_rate_kbps,
        qber,
        status: status.to_string(),
    }
}

fn platform(
    name: &str,
    kind: PlatformKind,
    status: PlatformStatus,
    link: &str,
    qrng_enabled: bool,
) -> DefensePlatform {
    DefensePlatform {
        name: name.to_string(),
        kind,
        status,
        link: link.to_string(),
        qrng_enabled,
    }
}

fn threat(
    timestamp: &str,
    threat_type: ThreatType,
    platform: PlatformKind,
    severity: Severity,
    status: ThreatStatus,
) -> ThreatEvent {
    ThreatEvent {
        timestamp: timestamp.to_string(),
        threat_type,
        platform,
        severity,
        status,
    }
}

fn points<const N: usize, const D: usize>(
    labels: [&str; N],
    values: [[f64; D]; N],
) -> Vec<SeriesPoint> {
    labels
        .into_iter()
        .zip(values)
        .map(|(label, v)| SeriesPoint::new(label, v.to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_four_platforms_in_secure_or_monitoring() {
        let seed = SeedData::builtin();
        assert_eq!(seed.platforms.len(), 4);
        assert!(seed.platforms.iter().all(|p| matches!(
            p.status,
            PlatformStatus::Secure | PlatformStatus::Monitoring
        )));
        assert!(seed.protocols.iter().all(Protocol::is_secure));
        assert!(seed.metrics.in_bounds());
    }

    #[test]
    fn builtin_threats_are_newest_first() {
        let seed = SeedData::builtin();
        let stamps: Vec<&str> = seed.threats.iter().map(|t| t.timestamp.as_str()).collect();
        let mut sorted = stamps.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(stamps, sorted);
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        let mut seed = SeedData::builtin();
        seed.platforms.truncate(2);
        std::fs::write(&path, serde_json::to_string(&seed).unwrap()).unwrap();
        let loaded = SeedData::load(&path).unwrap();
        assert_eq!(loaded.platforms, seed.platforms);
        assert_eq!(loaded.threats, seed.threats);
        assert_eq!(loaded.series.anomaly.len(), 10);
    }

    #[test]
    fn load_clamps_out_of_range_qrng() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        let json = r#"{ "qrng": {
            "generation_rate": "99 Tbps",
            "generation_gbps": 3.0,
            "entropy_level": 5.0,
            "randomness_tests_passed": 99,
            "current_buffer": 0
        } }"#;
        std::fs::write(&path, json).unwrap();
        let seed = SeedData::load(&path).unwrap();
        assert_eq!(seed.qrng.entropy_level, 1.0);
        assert_eq!(seed.qrng.randomness_tests_passed, 15);
        assert_eq!(seed.qrng.generation_rate, "3.0 Gbps");
    }

    #[test]
    fn partial_seed_fills_from_builtin() {
        let seed: SeedData = serde_json::from_str(r#"{ "protocols": [] }"#).unwrap();
        assert!(seed.protocols.is_empty());
        assert_eq!(seed.platforms.len(), 4);
    }
}
