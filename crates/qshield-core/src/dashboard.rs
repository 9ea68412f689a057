//! The dashboard: model, controllers and collaborators wired together.
//!
//! Every public entry point (a tick, a view selection, an action, a slider
//! change) runs its read-modify-write-project sequence to completion before
//! returning. Hosts serialize entry points, either on one thread (browser
//! timers) or behind a mutex (the native [`crate::scheduler::Scheduler`]).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::actions::Action;
use crate::chart::{ChartBackend, ChartSpec};
use crate::config::{AnomalyConfig, DashboardConfig};
use crate::display::DisplaySurface;
use crate::error::{Error, Result};
use crate::feed::{Clock, EventFeed, SystemClock, TIME_OF_DAY_FORMAT, TIMESTAMP_FORMAT};
use crate::metrics::{MetricsSnapshot, MetricsStore};
use crate::mutation::{DeltaSource, MutationEngine, RandomWalk};
use crate::network::{DefensePlatform, Protocol};
use crate::notify::{Level, Notification, Notifications};
use crate::qrng::{self, GenerationRun, QrngMetrics};
use crate::render::{self, Model, SyncReport};
use crate::seed::SeedData;
use crate::series::{SeriesPoint, SeriesSet};
use crate::threat::{Severity, ThreatEvent, ThreatLog, ThreatStatus};
use crate::uplink::{self, UplinkReport, UplinkStatus};
use crate::view::{Activation, ChartBinding, View, ViewController};

/// Draw one anomaly score: usually baseline noise, occasionally a spike.
pub fn sample_anomaly<R: Rng + ?Sized>(rng: &mut R, cfg: &AnomalyConfig) -> f64 {
    if rng.random_bool(cfg.spike_probability) {
        rng.random_range(cfg.spike_min..=cfg.spike_max)
    } else {
        rng.random_range(cfg.baseline_min..=cfg.baseline_max)
    }
}

/// Serializable copy of the whole model.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub taken_at: String,
    pub active_view: Option<View>,
    pub metrics: MetricsSnapshot,
    pub qrng: QrngMetrics,
    pub anomaly_threshold: f64,
    pub threats: Vec<ThreatEvent>,
    pub protocols: Vec<Protocol>,
    pub platforms: Vec<DefensePlatform>,
    pub series: SeriesSet,
    pub notifications: Vec<Notification>,
    pub last_uplink: Option<UplinkReport>,
}

#[derive(Debug, Clone)]
pub enum ActionOutcome {
    Generated(GenerationRun),
    Scanned(ThreatEvent),
    Transmitted(UplinkReport),
    Exported(Box<DashboardSnapshot>),
}

pub struct DashboardBuilder {
    config: DashboardConfig,
    seed: SeedData,
    rng_seed: Option<u64>,
    deltas: Option<Box<dyn DeltaSource>>,
    clock: Option<Box<dyn Clock>>,
}

impl DashboardBuilder {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            seed: SeedData::builtin(),
            rng_seed: None,
            deltas: None,
            clock: None,
        }
    }

    pub fn seed_data(mut self, seed: SeedData) -> Self {
        self.seed = seed;
        self
    }

    /// Fix every random draw to one seed.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Replace the random walk with another delta source.
    pub fn deltas(mut self, source: impl DeltaSource + 'static) -> Self {
        self.deltas = Some(Box::new(source));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validate the config, load the seed data and run the initial projection.
    pub fn build<S, C>(self, surface: S, charts: C) -> Result<Dashboard<S, C>>
    where
        S: DisplaySurface,
        C: ChartBackend,
    {
        self.config.validate()?;
        let clock: Box<dyn Clock> = self.clock.unwrap_or_else(|| Box::new(SystemClock));
        let seed_value = self.rng_seed.unwrap_or_else(|| {
            let now = clock.now();
            now.timestamp_nanos_opt()
                .unwrap_or_else(|| now.timestamp()) as u64
        });
        let mut rng = StdRng::seed_from_u64(seed_value);
        let deltas: Box<dyn DeltaSource> = match self.deltas {
            Some(source) => source,
            None => Box::new(RandomWalk::new(StdRng::from_rng(&mut rng), self.config.walk)),
        };

        let seed = self.seed.normalized();
        let mut dashboard = Dashboard {
            metrics: MetricsStore::new(seed.metrics),
            mutation: MutationEngine::new(deltas),
            qrng: seed.qrng,
            feed: EventFeed::new(self.config.event_capacity, seed.threats),
            protocols: seed.protocols,
            platforms: seed.platforms,
            series: SeriesSet::new(&self.config, &seed.series),
            notifications: Notifications::new(self.config.notification_ttl()),
            threshold: self.config.anomaly.threshold,
            views: ViewController::new(),
            rng,
            clock,
            surface,
            charts,
            torn_down: false,
            last_sync: SyncReport::default(),
            last_uplink: None,
            config: self.config,
        };
        dashboard.startup();
        Ok(dashboard)
    }
}

pub struct Dashboard<S, C> {
    config: DashboardConfig,
    metrics: MetricsStore,
    mutation: MutationEngine,
    qrng: QrngMetrics,
    feed: EventFeed,
    protocols: Vec<Protocol>,
    platforms: Vec<DefensePlatform>,
    series: SeriesSet,
    notifications: Notifications,
    threshold: f64,
    views: ViewController,
    rng: StdRng,
    clock: Box<dyn Clock>,
    surface: S,
    charts: C,
    torn_down: bool,
    last_sync: SyncReport,
    last_uplink: Option<UplinkReport>,
}

impl<S: DisplaySurface, C: ChartBackend> Dashboard<S, C> {
    fn startup(&mut self) {
        let report = self.sync();
        log::info!(
            "dashboard started: {} platforms, {} threats, {} skipped surfaces",
            self.platforms.len(),
            self.feed.log().len(),
            report.skipped.len()
        );
        self.select_view(View::default());
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Make `view` the only visible view, building its charts the first time.
    pub fn select_view(&mut self, view: View) -> Activation {
        if !self.surface.contains(view.container()) {
            log::warn!("view '{view}' has no '{}' container", view.container());
        }
        let Self {
            views,
            surface,
            charts,
            series,
            ..
        } = self;

        let activation = views.activate(view, |v| build_charts(&*surface, charts, series, v));
        match activation {
            Activation::Deferred => {
                log::warn!("view '{view}' active without charts; retrying on next activation")
            }
            _ => log::info!("view '{view}' active ({activation:?})"),
        }

        let mut report = SyncReport::default();
        render::sync_views(&mut self.surface, Some(view), &mut report);
        render::sync_charts(
            &mut self.charts,
            self.views.bindings_mut(),
            &self.series,
            &mut report,
        );
        self.last_sync = report;
        activation
    }

    pub fn select_view_named(&mut self, name: &str) -> Result<Activation> {
        let view: View = name.parse()?;
        Ok(self.select_view(view))
    }

    // -----------------------------------------------------------------------
    // Ticks
    // -----------------------------------------------------------------------

    /// Metric mutation tick: perturb, then project the scalar displays.
    pub fn mutation_tick(&mut self) -> MetricsSnapshot {
        if self.torn_down {
            return self.metrics.snapshot();
        }
        let snapshot = self.mutation.tick(&mut self.metrics);
        let label = self.time_label();
        self.series.performance.append(SeriesPoint::new(
            label,
            vec![
                f64::from(snapshot.cpu_usage),
                f64::from(snapshot.network_latency),
            ],
        ));
        let mut report = SyncReport::default();
        render::sync_metrics(&mut self.surface, &snapshot, &mut report);
        self.last_sync = report;
        snapshot
    }

    /// Event feed tick: synthesize one threat and re-project the list.
    pub fn event_tick(&mut self) -> Option<ThreatEvent> {
        if self.torn_down {
            return None;
        }
        let event = self.feed.tick(&mut self.rng, self.clock.as_ref());
        self.record_detection();
        let mut report = SyncReport::default();
        render::sync_threats(&mut self.surface, self.feed.log(), &mut report);
        self.last_sync = report;
        Some(event)
    }

    /// Chart refresh tick: expire notices, sample an anomaly score, push new
    /// rows to every live chart.
    pub fn chart_tick(&mut self) -> Option<f64> {
        if self.torn_down {
            return None;
        }
        let now = self.clock.now();
        self.notifications.prune(now);

        let score = sample_anomaly(&mut self.rng, &self.config.anomaly);
        self.series.anomaly.append(SeriesPoint::new(
            now.format(TIME_OF_DAY_FORMAT).to_string(),
            vec![score, self.threshold],
        ));
        if score > self.threshold {
            self.notifications.push(
                format!(
                    "AI anomaly score {score:.2} exceeds threshold {:.2}",
                    self.threshold
                ),
                Level::Warning,
                now,
            );
        }

        let mut report = SyncReport::default();
        render::sync_analytics(&mut self.surface, &self.series, self.threshold, &mut report);
        render::sync_notifications(&mut self.surface, &self.notifications, &mut report);
        render::sync_charts(
            &mut self.charts,
            self.views.bindings_mut(),
            &self.series,
            &mut report,
        );
        self.last_sync = report;
        Some(score)
    }

    // -----------------------------------------------------------------------
    // User interaction
    // -----------------------------------------------------------------------

    pub fn handle_action(&mut self, action: Action) -> ActionOutcome {
        log::info!("action: {}", action.name());
        let now = self.clock.now();
        let outcome = match action {
            Action::GenerateQrng => {
                let run = qrng::generate(&mut self.rng, &self.qrng, self.config.qrng_sample_bytes);
                self.qrng = run.metrics.clone();
                let label = format!("G#{}", self.series.entropy.appended() + 1);
                self.series
                    .entropy
                    .append(SeriesPoint::new(label, vec![self.qrng.entropy_level]));
                self.notifications.push(
                    format!(
                        "Generated {} quantum bits: entropy {:.4}, {}/{} tests passed",
                        run.bytes.len() * 8,
                        self.qrng.entropy_level,
                        self.qrng.randomness_tests_passed,
                        qshield_tests::BATTERY_SIZE
                    ),
                    Level::Info,
                    now,
                );
                ActionOutcome::Generated(run)
            }
            Action::ThreatScan => {
                let event = self.feed.tick(&mut self.rng, self.clock.as_ref());
                self.record_detection();
                let level = match event.severity {
                    Severity::High => Level::Alert,
                    Severity::Medium => Level::Warning,
                    Severity::Low => Level::Info,
                };
                self.notifications.push(
                    format!(
                        "Scan: {} on {} platform ({})",
                        event.threat_type, event.platform, event.severity
                    ),
                    level,
                    now,
                );
                ActionOutcome::Scanned(event)
            }
            Action::Transmit { mode, attack } => {
                let report = uplink::transmit(mode, attack);
                for phase in &report.phases {
                    log::debug!("uplink [{}] {}", phase.stage, phase.detail);
                }
                if let Some(event) = report.threat_event(now.format(TIMESTAMP_FORMAT).to_string()) {
                    self.feed.insert(event);
                    self.record_detection();
                }
                let level = match report.status {
                    UplinkStatus::Success => Level::Info,
                    UplinkStatus::Defended => Level::Warning,
                    UplinkStatus::Compromised => Level::Alert,
                };
                self.notifications.push(report.message, level, now);
                self.last_uplink = Some(report.clone());
                ActionOutcome::Transmitted(report)
            }
            Action::ExportSnapshot => {
                self.notifications
                    .push("Snapshot exported", Level::Info, now);
                ActionOutcome::Exported(Box::new(self.snapshot()))
            }
        };
        self.sync();
        outcome
    }

    /// Slider moved. Values outside `[0, 1]` are ignored.
    pub fn slider_changed(&mut self, value: f64) -> bool {
        if !(0.0..=1.0).contains(&value) {
            log::warn!("ignoring anomaly threshold {value}: outside [0, 1]");
            return false;
        }
        self.threshold = value;
        let mut report = SyncReport::default();
        render::sync_analytics(&mut self.surface, &self.series, self.threshold, &mut report);
        self.last_sync = report;
        true
    }

    // -----------------------------------------------------------------------
    // Projection & lifecycle
    // -----------------------------------------------------------------------

    /// Full projection of the model onto every surface and live chart.
    pub fn sync(&mut self) -> SyncReport {
        let snapshot = self.metrics.snapshot();
        let model = Model {
            metrics: &snapshot,
            qrng: &self.qrng,
            threats: self.feed.log(),
            protocols: &self.protocols,
            platforms: &self.platforms,
            notifications: &self.notifications,
            series: &self.series,
            threshold: self.threshold,
            active_view: self.views.active(),
        };
        let mut report = render::sync_surface(&mut self.surface, &model);
        let mut charts = SyncReport::default();
        render::sync_charts(
            &mut self.charts,
            self.views.bindings_mut(),
            &self.series,
            &mut charts,
        );
        report.merge(charts);
        self.last_sync = report.clone();
        report
    }

    /// Destroy every constructed chart. Safe to call any number of times.
    pub fn teardown(&mut self) -> usize {
        if self.torn_down {
            log::debug!("teardown: already released");
            return 0;
        }
        self.torn_down = true;
        let handles = self.views.teardown();
        for &handle in &handles {
            self.charts.destroy(handle);
        }
        log::info!("dashboard torn down: {} charts released", handles.len());
        handles.len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            taken_at: self.clock.now().format(TIMESTAMP_FORMAT).to_string(),
            active_view: self.views.active(),
            metrics: self.metrics.snapshot(),
            qrng: self.qrng.clone(),
            anomaly_threshold: self.threshold,
            threats: self.feed.log().iter().cloned().collect(),
            protocols: self.protocols.clone(),
            platforms: self.platforms.clone(),
            series: self.series.clone(),
            notifications: self.notifications.iter().cloned().collect(),
            last_uplink: self.last_uplink.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Write `qshield-snapshot-<epoch>.json` into `dir`.
    pub fn export_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let epoch = self.clock.now().timestamp();
        let path = dir.as_ref().join(format!("qshield-snapshot-{epoch}.json"));
        let json = self.export_json()?;
        std::fs::write(&path, json).map_err(|e| Error::io(&path, e))?;
        log::info!("snapshot exported to {}", path.display());
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn qrng(&self) -> &QrngMetrics {
        &self.qrng
    }

    pub fn threats(&self) -> &ThreatLog {
        self.feed.log()
    }

    pub fn protocols(&self) -> &[Protocol] {
        &self.protocols
    }

    pub fn platforms(&self) -> &[DefensePlatform] {
        &self.platforms
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn views(&self) -> &ViewController {
        &self.views
    }

    pub fn active_view(&self) -> Option<View> {
        self.views.active()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn charts(&self) -> &C {
        &self.charts
    }

    pub fn last_sync(&self) -> &SyncReport {
        &self.last_sync
    }

    pub fn last_uplink(&self) -> Option<&UplinkReport> {
        self.last_uplink.as_ref()
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    fn time_label(&self) -> String {
        self.clock.now().format(TIME_OF_DAY_FORMAT).to_string()
    }

    /// Append the current log composition to the detection series.
    fn record_detection(&mut self) {
        let log = self.feed.log();
        let stopped = log
            .iter()
            .filter(|e| matches!(e.status, ThreatStatus::Blocked | ThreatStatus::Neutralized))
            .count();
        let point = SeriesPoint::new(self.time_label(), vec![log.len() as f64, stopped as f64]);
        self.series.detection.append(point);
    }
}

/// Build every chart `view` needs, or none of them.
fn build_charts<S, C>(
    surface: &S,
    charts: &mut C,
    series: &SeriesSet,
    view: View,
) -> Option<Vec<ChartBinding>>
where
    S: DisplaySurface + ?Sized,
    C: ChartBackend + ?Sized,
{
    if !surface.contains(view.container()) {
        return None;
    }
    let mut built = Vec::with_capacity(view.charts().len());
    for &id in view.charts() {
        let container = id.container();
        let handle = if surface.contains(container) {
            charts.construct(container, &ChartSpec::for_chart(id, series.get(id).capacity()))
        } else {
            None
        };
        match handle {
            Some(handle) => {
                log::info!("constructed {} chart in '{container}'", id.title());
                built.push(ChartBinding {
                    id,
                    handle,
                    pushed: 0,
                });
            }
            None => {
                for binding in built {
                    charts.destroy(binding.handle);
                }
                return None;
            }
        }
    }
    Some(built)
}
