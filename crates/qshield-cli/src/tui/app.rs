//! TUI application state and event loop.
//!
//! The scheduler's timer threads mutate the dashboard; the UI thread captures
//! what it draws in a single lock per frame and turns key presses into
//! dashboard actions under the same lock. Everything drawn is read back from
//! the in-memory display surface and charts, never from the model directly.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use qshield_core::chart::MemoryChart;
use qshield_core::render::ids;
use qshield_core::{
    Action, ActionOutcome, ChartId, ChartKind, Dashboard, Element, MemoryCharts, MemorySurface,
    Scheduler, SharedDashboard, UplinkMode, UplinkReport, View,
};

/// Slider step for `[` and `]`.
pub const THRESHOLD_STEP: f64 = 0.05;

// ---------------------------------------------------------------------------
// Snapshot: single-lock capture of everything the UI draws
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSnapshot {
    pub label: String,
    pub color: Color,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub id: ChartId,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<DatasetSnapshot>,
    pub y_range: (f64, f64),
}

impl ChartSnapshot {
    fn from_chart(chart: &MemoryChart) -> Self {
        let datasets: Vec<DatasetSnapshot> = chart
            .spec
            .datasets
            .iter()
            .enumerate()
            .map(|(i, style)| DatasetSnapshot {
                label: style.label.clone(),
                color: parse_color(&style.color),
                values: chart
                    .series
                    .dataset(i)
                    .map(|d| d.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();
        let y_range = chart
            .spec
            .y_range
            .unwrap_or_else(|| auto_range(datasets.iter().flat_map(|d| d.values.iter().copied())));
        Self {
            id: chart.spec.id,
            kind: chart.spec.kind,
            labels: chart.series.labels().iter().cloned().collect(),
            datasets,
            y_range,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// What one frame shows.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub view: View,
    /// Text of every scalar container, by container id.
    pub texts: BTreeMap<&'static str, String>,
    pub cpu_usage: u8,
    pub quantum_coherence: f64,
    pub threshold: f64,
    pub threats: Vec<Element>,
    pub platforms: Vec<Element>,
    pub protocols: Vec<Element>,
    pub notifications: Vec<Element>,
    pub charts: Vec<ChartSnapshot>,
    pub last_uplink: Option<UplinkReport>,
    pub time: String,
}

impl Snapshot {
    pub fn text(&self, id: &str) -> &str {
        self.texts.get(id).map_or("—", String::as_str)
    }

    pub fn chart(&self, id: ChartId) -> Option<&ChartSnapshot> {
        self.charts.iter().find(|c| c.id == id)
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    shared: SharedDashboard<MemorySurface, MemoryCharts>,
    scheduler: Scheduler<MemorySurface, MemoryCharts>,
    running: bool,
    status: Option<String>,
    last_export: Option<PathBuf>,
}

impl App {
    pub fn new(dashboard: Dashboard<MemorySurface, MemoryCharts>) -> Self {
        let shared = Arc::new(Mutex::new(dashboard));
        let scheduler = Scheduler::start(Arc::clone(&shared));
        Self {
            shared,
            scheduler,
            running: true,
            status: None,
            last_export: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before the panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        self.scheduler.shutdown();
        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.select(View::ALL[index]);
            }
            KeyCode::Tab => {
                let next = self.lock().active_view().unwrap_or_default().next();
                self.select(next);
            }
            KeyCode::Char('g') => self.act(Action::GenerateQrng),
            KeyCode::Char('t') => self.act(Action::ThreatScan),
            KeyCode::Char('u') => self.transmit(UplinkMode::Quantum, false),
            KeyCode::Char('U') => self.transmit(UplinkMode::Quantum, true),
            KeyCode::Char('c') => self.transmit(UplinkMode::Classical, false),
            KeyCode::Char('C') => self.transmit(UplinkMode::Classical, true),
            KeyCode::Char('[') => self.nudge_threshold(-THRESHOLD_STEP),
            KeyCode::Char(']') => self.nudge_threshold(THRESHOLD_STEP),
            KeyCode::Char('s') => self.export_snapshot(),
            _ => {}
        }
    }

    fn select(&mut self, view: View) {
        self.lock().select_view(view);
        self.status = Some(format!("{} view", view.title()));
    }

    fn transmit(&mut self, mode: UplinkMode, attack: bool) {
        self.act(Action::Transmit { mode, attack });
    }

    fn act(&mut self, action: Action) {
        let outcome = self.lock().handle_action(action);
        self.status = Some(describe(&outcome));
    }

    fn nudge_threshold(&mut self, step: f64) {
        let mut d = self.lock();
        let value = ((d.threshold() + step) * 100.0).round() / 100.0;
        let value = value.clamp(0.0, 1.0);
        d.slider_changed(value);
        drop(d);
        self.status = Some(format!("anomaly threshold {value:.2}"));
    }

    fn export_snapshot(&mut self) {
        let result = self.lock().export_to(".");
        match result {
            Ok(path) => {
                self.status = Some(format!("snapshot written to {}", path.display()));
                self.last_export = Some(path);
            }
            Err(e) => self.status = Some(format!("export failed: {e}")),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Dashboard<MemorySurface, MemoryCharts>> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    // --- Public accessors ---

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn last_export(&self) -> Option<&PathBuf> {
        self.last_export.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        let d = self.lock();
        let surface = d.surface();
        let view = d.active_view().unwrap_or_default();
        let metrics = d.metrics();

        let texts = ids::FIELDS
            .iter()
            .filter_map(|&id| surface.text(id).map(|t| (id, t.to_string())))
            .collect();
        let charts = view
            .charts()
            .iter()
            .filter_map(|&id| d.charts().chart(id))
            .map(ChartSnapshot::from_chart)
            .collect();

        Snapshot {
            view,
            texts,
            cpu_usage: metrics.cpu_usage,
            quantum_coherence: metrics.quantum_coherence,
            threshold: d.threshold(),
            threats: surface.children(ids::THREAT_FEED).to_vec(),
            platforms: surface.children(ids::PLATFORM_LIST).to_vec(),
            protocols: surface.children(ids::PROTOCOL_LIST).to_vec(),
            notifications: surface.children(ids::NOTIFICATIONS).to_vec(),
            charts,
            last_uplink: d.last_uplink().cloned(),
            time: d.now().format("%H:%M:%S").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// One status-line sentence for an action outcome.
pub fn describe(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Generated(run) => format!(
            "generated {} bytes, entropy {:.4}, {} tests passed",
            run.bytes.len(),
            run.metrics.entropy_level,
            run.passed()
        ),
        ActionOutcome::Scanned(event) => format!(
            "scan: {} on {} ({}, {})",
            event.threat_type, event.platform, event.severity, event.status
        ),
        ActionOutcome::Transmitted(report) => match report.qber {
            Some(qber) => format!(
                "{} uplink: {} (QBER {:.2}%)",
                report.mode,
                report.message,
                qber * 100.0
            ),
            None => format!("{} uplink: {}", report.mode, report.message),
        },
        ActionOutcome::Exported(snapshot) => {
            format!("snapshot taken at {}", snapshot.taken_at)
        }
    }
}

/// `#rrggbb` to a terminal color; cyan when unparseable.
pub fn parse_color(hex: &str) -> Color {
    hex.parse().unwrap_or(Color::Cyan)
}

/// Y bounds for charts without a fixed range: zero to 20% above the maximum.
pub fn auto_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let max = values.filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    if max <= 0.0 { (0.0, 1.0) } else { (0.0, max * 1.2) }
}

/// Row color from a severity or status class.
pub fn class_color(class: &str) -> Color {
    const RED: [&str; 4] = ["high", "alert", "breached", "insecure"];
    const YELLOW: [&str; 3] = ["medium", "monitoring", "warning"];
    if RED.iter().any(|k| class.contains(k)) {
        Color::Red
    } else if YELLOW.iter().any(|k| class.contains(k)) {
        Color::Yellow
    } else {
        Color::Green
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
