//! Render synchronizer: projects the model onto display surfaces and charts.
//!
//! Projection only reads the model. Text and style writes are plain
//! overwrites, and charts receive only rows they have not seen yet, so
//! running a pass twice on unchanged state changes nothing the second time.
//! A missing container skips that one projection; the rest of the pass runs.

use crate::chart::ChartBackend;
use crate::display::{DisplaySurface, Element};
use crate::error::SurfaceError;
use crate::metrics::MetricsSnapshot;
use crate::network::{DefensePlatform, Protocol};
use crate::notify::Notifications;
use crate::qrng::QrngMetrics;
use crate::series::SeriesSet;
use crate::threat::ThreatLog;
use crate::view::{ChartBinding, View};

/// Container ids written by the synchronizer.
pub mod ids {
    pub const CPU_USAGE: &str = "cpu-usage";
    pub const CPU_BAR: &str = "cpu-bar";
    pub const QUANTUM_COHERENCE: &str = "quantum-coherence";
    pub const COHERENCE_INDICATOR: &str = "coherence-indicator";
    pub const NETWORK_LATENCY: &str = "network-latency";
    pub const SECURITY_SCORE: &str = "security-score";

    pub const GENERATION_RATE: &str = "generation-rate";
    pub const ENTROPY_LEVEL: &str = "entropy-level";
    pub const TESTS_PASSED: &str = "tests-passed";
    pub const CURRENT_BUFFER: &str = "current-buffer";

    pub const THREAT_FEED: &str = "threat-feed";
    pub const THREAT_COUNT: &str = "threat-count";

    pub const PLATFORM_LIST: &str = "platform-list";
    pub const PLATFORM_COUNT: &str = "platform-count";
    pub const PROTOCOL_LIST: &str = "protocol-list";
    pub const PROTOCOL_COUNT: &str = "protocol-count";

    pub const ANOMALY_SCORE: &str = "anomaly-score";
    pub const ANOMALY_THRESHOLD: &str = "anomaly-threshold";
    pub const NOTIFICATIONS: &str = "notifications";

    /// Every text/style/list container, without view or chart containers.
    pub const FIELDS: [&str; 19] = [
        CPU_USAGE,
        CPU_BAR,
        QUANTUM_COHERENCE,
        COHERENCE_INDICATOR,
        NETWORK_LATENCY,
        SECURITY_SCORE,
        GENERATION_RATE,
        ENTROPY_LEVEL,
        TESTS_PASSED,
        CURRENT_BUFFER,
        THREAT_FEED,
        THREAT_COUNT,
        PLATFORM_LIST,
        PLATFORM_COUNT,
        PROTOCOL_LIST,
        PROTOCOL_COUNT,
        ANOMALY_SCORE,
        ANOMALY_THRESHOLD,
        NOTIFICATIONS,
    ];
}

/// Every container a full dashboard page provides.
pub fn page_containers() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = ids::FIELDS.to_vec();
    all.extend(View::ALL.iter().map(|v| v.container()));
    all.extend(crate::chart::ChartId::ALL.iter().map(|c| c.container()));
    all
}

/// What one synchronization pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Successful surface writes.
    pub writes: usize,
    /// Containers that were absent, in pass order.
    pub skipped: Vec<String>,
    pub points_pushed: usize,
    pub redraws: usize,
}

impl SyncReport {
    fn record(&mut self, result: Result<(), SurfaceError>) -> bool {
        match result {
            Ok(()) => {
                self.writes += 1;
                true
            }
            Err(SurfaceError::Missing(id)) => {
                log::debug!("skipping projection: '{id}' not on surface");
                if !self.skipped.contains(&id) {
                    self.skipped.push(id);
                }
                false
            }
        }
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.writes += other.writes;
        self.points_pushed += other.points_pushed;
        self.redraws += other.redraws;
        for id in other.skipped {
            if !self.skipped.contains(&id) {
                self.skipped.push(id);
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Read-only view of everything the synchronizer projects.
#[derive(Debug, Clone, Copy)]
pub struct Model<'a> {
    pub metrics: &'a MetricsSnapshot,
    pub qrng: &'a QrngMetrics,
    pub threats: &'a ThreatLog,
    pub protocols: &'a [Protocol],
    pub platforms: &'a [DefensePlatform],
    pub notifications: &'a Notifications,
    pub series: &'a SeriesSet,
    pub threshold: f64,
    pub active_view: Option<View>,
}

/// Scalar system metrics, progress bar and coherence indicator.
pub fn sync_metrics<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    m: &MetricsSnapshot,
    report: &mut SyncReport,
) {
    let cpu = format!("{}%", m.cpu_usage);
    report.record(surface.set_text(ids::CPU_USAGE, &cpu));
    report.record(surface.set_style(ids::CPU_BAR, "width", &cpu));
    report.record(surface.set_text(
        ids::QUANTUM_COHERENCE,
        &format!("{:.3}", m.quantum_coherence),
    ));
    report.record(surface.set_style(
        ids::COHERENCE_INDICATOR,
        "background",
        &coherence_gradient(m.quantum_coherence),
    ));
    report.record(surface.set_text(ids::NETWORK_LATENCY, &format!("{}ms", m.network_latency)));
    report.record(surface.set_text(ids::SECURITY_SCORE, &m.security_score.to_string()));
}

/// Conic-gradient fill proportional to coherence.
pub fn coherence_gradient(coherence: f64) -> String {
    let pct = (coherence * 100.0).clamp(0.0, 100.0);
    format!("conic-gradient(#00ff88 0% {pct:.1}%, #1a1f3a {pct:.1}% 100%)")
}

pub fn sync_qrng<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    q: &QrngMetrics,
    report: &mut SyncReport,
) {
    report.record(surface.set_text(ids::GENERATION_RATE, &q.generation_rate));
    report.record(surface.set_text(ids::ENTROPY_LEVEL, &format!("{:.4}", q.entropy_level)));
    report.record(surface.set_text(
        ids::TESTS_PASSED,
        &format!("{}/{}", q.randomness_tests_passed, qshield_tests::BATTERY_SIZE),
    ));
    report.record(surface.set_text(ids::CURRENT_BUFFER, &format!("{} bits", q.current_buffer)));
}

/// Replace the children of a list container. Skips the rows if the list is absent.
fn replace_list<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    id: &str,
    rows: impl IntoIterator<Item = Element>,
    report: &mut SyncReport,
) {
    if !report.record(surface.clear_children(id)) {
        return;
    }
    for row in rows {
        if !report.record(surface.append_child(id, row)) {
            return;
        }
    }
}

pub fn sync_threats<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    threats: &ThreatLog,
    report: &mut SyncReport,
) {
    let rows = threats.iter().map(|t| {
        Element::new("div")
            .class(format!("threat-item {}", t.severity.class()))
            .text(format!(
                "{} | {} | {} | {} | {}",
                t.time_of_day(),
                t.threat_type,
                t.platform,
                t.severity,
                t.status
            ))
    });
    replace_list(surface, ids::THREAT_FEED, rows, report);
    report.record(surface.set_text(ids::THREAT_COUNT, &threats.len().to_string()));
}

pub fn sync_network<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    protocols: &[Protocol],
    platforms: &[DefensePlatform],
    report: &mut SyncReport,
) {
    let platform_rows = platforms.iter().map(|p| {
        Element::new("div")
            .class(format!("platform-item {}", p.status.class()))
            .text(format!(
                "{} | {} | {} | {}{}",
                p.name,
                p.kind,
                p.link,
                p.status,
                if p.qrng_enabled { " | QRNG" } else { "" }
            ))
    });
    replace_list(surface, ids::PLATFORM_LIST, platform_rows, report);
    report.record(surface.set_text(ids::PLATFORM_COUNT, &platforms.len().to_string()));

    let protocol_rows = protocols.iter().map(|p| {
        let verdict = if p.is_secure() { "SECURE" } else { "ABORT" };
        Element::new("div")
            .class(if p.is_secure() {
                "protocol-item protocol-secure"
            } else {
                "protocol-item protocol-insecure"
            })
            .text(format!(
                "{} | {:.1} kbps | QBER {:.1}% | {} | {verdict}",
                p.name,
                p.key_rate_kbps,
                p.qber * 100.0,
                p.status
            ))
    });
    replace_list(surface, ids::PROTOCOL_LIST, protocol_rows, report);
    let secure = protocols.iter().filter(|p| p.is_secure()).count();
    report.record(surface.set_text(
        ids::PROTOCOL_COUNT,
        &format!("{secure}/{}", protocols.len()),
    ));
}

pub fn sync_analytics<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    series: &SeriesSet,
    threshold: f64,
    report: &mut SyncReport,
) {
    let score = series
        .anomaly
        .latest()
        .and_then(|p| p.values.first().copied())
        .unwrap_or(0.0);
    report.record(surface.set_text(ids::ANOMALY_SCORE, &format!("{score:.2}")));
    report.record(surface.set_text(ids::ANOMALY_THRESHOLD, &format!("{threshold:.2}")));
}

pub fn sync_notifications<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    notifications: &Notifications,
    report: &mut SyncReport,
) {
    let rows = notifications
        .iter()
        .map(|n| Element::new("div").class(n.level.class()).text(n.message.clone()));
    replace_list(surface, ids::NOTIFICATIONS, rows, report);
}

/// Show the active view's container and hide all others.
pub fn sync_views<S: DisplaySurface + ?Sized>(
    surface: &mut S,
    active: Option<View>,
    report: &mut SyncReport,
) {
    for view in View::ALL {
        let display = if Some(view) == active { "block" } else { "none" };
        report.record(surface.set_style(view.container(), "display", display));
    }
}

/// Push rows each chart has not received yet and redraw the charts that changed.
pub fn sync_charts<'b, C: ChartBackend + ?Sized>(
    charts: &mut C,
    bindings: impl IntoIterator<Item = &'b mut ChartBinding>,
    series: &SeriesSet,
    report: &mut SyncReport,
) {
    for binding in bindings {
        let buffer = series.get(binding.id);
        let mut pushed = 0;
        for point in buffer.points_since(binding.pushed) {
            charts.append_point(binding.handle, &point.label, &point.values);
            pushed += 1;
        }
        binding.pushed = buffer.appended();
        if pushed > 0 {
            charts.redraw(binding.handle);
            report.points_pushed += pushed;
            report.redraws += 1;
        }
    }
}

/// Full projection of every non-chart surface.
pub fn sync_surface<S: DisplaySurface + ?Sized>(surface: &mut S, model: &Model<'_>) -> SyncReport {
    let mut report = SyncReport::default();
    sync_views(surface, model.active_view, &mut report);
    sync_metrics(surface, model.metrics, &mut report);
    sync_qrng(surface, model.qrng, &mut report);
    sync_threats(surface, model.threats, &mut report);
    sync_network(surface, model.protocols, model.platforms, &mut report);
    sync_analytics(surface, model.series, model.threshold, &mut report);
    sync_notifications(surface, model.notifications, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::display::MemorySurface;
    use crate::seed::SeedData;
    use std::time::Duration;

    struct Fixture {
        seed: SeedData,
        threats: ThreatLog,
        notifications: Notifications,
        series: SeriesSet,
    }

    impl Fixture {
        fn new() -> Self {
            let seed = SeedData::builtin();
            let mut threats = ThreatLog::new(10);
            threats.seed(seed.threats.clone());
            let series = SeriesSet::new(&DashboardConfig::default(), &seed.series);
            Self {
                seed,
                threats,
                notifications: Notifications::new(Duration::from_secs(3)),
                series,
            }
        }

        fn model(&self) -> Model<'_> {
            Model {
                metrics: &self.seed.metrics,
                qrng: &self.seed.qrng,
                threats: &self.threats,
                protocols: &self.seed.protocols,
                platforms: &self.seed.platforms,
                notifications: &self.notifications,
                series: &self.series,
                threshold: 0.7,
                active_view: Some(View::Overview),
            }
        }
    }

    #[test]
    fn full_pass_writes_every_field() {
        let f = Fixture::new();
        let mut surface = MemorySurface::with_containers(page_containers());
        let report = sync_surface(&mut surface, &f.model());
        assert!(report.is_complete(), "{:?}", report.skipped);
        assert_eq!(surface.text(ids::CPU_USAGE), Some("67%"));
        assert_eq!(surface.style(ids::CPU_BAR, "width"), Some("67%"));
        assert_eq!(surface.text(ids::QUANTUM_COHERENCE), Some("0.987"));
        assert_eq!(surface.text(ids::TESTS_PASSED), Some("15/15"));
        assert_eq!(surface.children(ids::PLATFORM_LIST).len(), 4);
        assert_eq!(surface.style("overview-view", "display"), Some("block"));
        assert_eq!(surface.style("analytics-view", "display"), Some("none"));
        assert!(
            surface
                .style(ids::COHERENCE_INDICATOR, "background")
                .unwrap()
                .contains("98.7%")
        );
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let f = Fixture::new();
        let mut surface = MemorySurface::with_containers(page_containers());
        sync_surface(&mut surface, &f.model());
        let first = surface.clone();
        sync_surface(&mut surface, &f.model());
        assert_eq!(surface, first);
    }

    #[test]
    fn missing_containers_are_skipped_not_fatal() {
        let f = Fixture::new();
        let mut surface = MemorySurface::with_containers(page_containers());
        surface.remove_container(ids::CPU_USAGE);
        surface.remove_container(ids::THREAT_FEED);
        let report = sync_surface(&mut surface, &f.model());
        assert_eq!(report.skipped, vec![ids::CPU_USAGE, ids::THREAT_FEED]);
        // everything after the gaps still projected
        assert_eq!(surface.text(ids::THREAT_COUNT), Some("5"));
        assert_eq!(surface.text(ids::SECURITY_SCORE), Some("98"));
    }

    #[test]
    fn empty_surface_skips_everything() {
        let f = Fixture::new();
        let mut surface = MemorySurface::new();
        let report = sync_surface(&mut surface, &f.model());
        assert_eq!(report.writes, 0);
        assert!(!report.skipped.is_empty());
    }
}
