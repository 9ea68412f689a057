//! Quantum Shield WebAssembly bindings: the dashboard running in a browser page.
//!
//! The page provides the containers (`cpu-usage`, `threat-feed`,
//! `analytics-view`, …) and a chart bridge object; this crate wires them to
//! the engine and drives it with three `setInterval` timers:
//!
//! ```js
//! const dashboard = new WasmDashboard(chartBridge, configJson);
//! dashboard.start();
//! tab.onclick = () => dashboard.select_view("analytics");
//! button.onclick = () => dashboard.action("generate-qrng");
//! window.addEventListener("pagehide", () => dashboard.stop());
//! ```
//!
//! Browser timers run on the page's single thread, so every tick finishes its
//! read-modify-write-project sequence before the next callback starts.

mod charts;
mod dom;

use std::cell::RefCell;
use std::rc::Rc;

use qshield_core::{Action, Dashboard, DashboardBuilder, DashboardConfig, View};
use wasm_bindgen::prelude::*;

pub use charts::JsCharts;
pub use dom::DomSurface;

type PageDashboard = Dashboard<DomSurface, JsCharts>;

// ---------------------------------------------------------------------------
// Browser API helpers
// ---------------------------------------------------------------------------

/// `performance.now()` in milliseconds, or 0 outside a window.
fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |perf| perf.now())
}

/// Fill a buffer with `crypto.getRandomValues()`.
fn crypto_get_random(buf: &mut [u8]) -> bool {
    let Some(crypto) = web_sys::window().and_then(|w| w.crypto().ok()) else {
        return false;
    };
    match crypto.get_random_values_with_u8_array(buf) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("crypto.getRandomValues failed: {e:?}");
            false
        }
    }
}

/// RNG seed from the browser CSPRNG, or from timer bits when it is unavailable.
fn browser_seed() -> u64 {
    let mut buf = [0u8; 8];
    if crypto_get_random(&mut buf) {
        seed_from_bytes(buf)
    } else {
        performance_now().to_bits()
    }
}

fn seed_from_bytes(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(bytes)
}

// ---------------------------------------------------------------------------
// Console logging
// ---------------------------------------------------------------------------

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

fn level_filter(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}

/// Route engine logs to the browser console. Later calls only change the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level_filter(level));
}

#[wasm_bindgen]
pub fn version() -> String {
    qshield_core::VERSION.to_string()
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

struct Interval {
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

/// Dashboard bound to the current page.
#[wasm_bindgen]
pub struct WasmDashboard {
    inner: Rc<RefCell<PageDashboard>>,
    intervals: Vec<Interval>,
    stopped: bool,
}

#[wasm_bindgen]
impl WasmDashboard {
    /// Build against `window.document` and the given chart bridge. `config_json`
    /// may be omitted for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        chart_bridge: JsValue,
        config_json: Option<String>,
    ) -> Result<WasmDashboard, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) => {
                let config: DashboardConfig = serde_json::from_str(json).map_err(js_error)?;
                config.validate().map_err(js_error)?;
                config
            }
            None => DashboardConfig::default(),
        };
        let surface = DomSurface::from_window()
            .ok_or_else(|| JsValue::from_str("no document to render into"))?;
        let charts = JsCharts::new(chart_bridge)?;

        let dashboard = DashboardBuilder::new(config)
            .rng_seed(browser_seed())
            .build(surface, charts)
            .map_err(js_error)?;
        Ok(WasmDashboard {
            inner: Rc::new(RefCell::new(dashboard)),
            intervals: Vec::new(),
            stopped: false,
        })
    }

    /// Register the mutation, chart and event timers. No-op once running or stopped.
    pub fn start(&mut self) -> Result<(), JsValue> {
        if self.stopped || !self.intervals.is_empty() {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let (mutation, chart, event) = {
            let d = self.inner.borrow();
            let c = d.config();
            (c.mutation_period_ms, c.chart_period_ms, c.event_period_ms)
        };

        let timers: [(&'static str, u64, fn(&mut PageDashboard)); 3] = [
            ("mutation", mutation, |d| {
                d.mutation_tick();
            }),
            ("chart", chart, |d| {
                d.chart_tick();
            }),
            ("event", event, |d| {
                d.event_tick();
            }),
        ];
        for (name, period, tick) in timers {
            let inner = Rc::clone(&self.inner);
            let callback = Closure::wrap(Box::new(move || match inner.try_borrow_mut() {
                Ok(mut d) => tick(&mut d),
                Err(_) => log::debug!("{name} tick skipped: dashboard busy"),
            }) as Box<dyn FnMut()>);

            let timeout = i32::try_from(period).unwrap_or(i32::MAX);
            match window.set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                timeout,
            ) {
                Ok(id) => self.intervals.push(Interval {
                    id,
                    _callback: callback,
                }),
                Err(e) => {
                    self.clear_intervals();
                    return Err(e);
                }
            }
        }
        log::info!("timers started: mutation {mutation}ms, chart {chart}ms, event {event}ms");
        Ok(())
    }

    /// Clear every timer and release the charts. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.clear_intervals();
        if !self.stopped {
            self.stopped = true;
            self.inner.borrow_mut().teardown();
        }
    }

    pub fn is_running(&self) -> bool {
        !self.intervals.is_empty()
    }

    /// Show the named view (`overview`, `qkd`, `qrng`, `threats`, `analytics`).
    pub fn select_view(&self, name: &str) -> Result<(), JsValue> {
        let view: View = name.parse().map_err(js_error)?;
        self.inner.borrow_mut().select_view(view);
        Ok(())
    }

    pub fn active_view(&self) -> Option<String> {
        self.inner.borrow().active_view().map(|v| v.name().to_string())
    }

    /// Run a named action, e.g. `generate-qrng` or `transmit-quantum-attack`.
    pub fn action(&self, name: &str) -> Result<(), JsValue> {
        let action: Action = name.parse().map_err(js_error)?;
        self.inner.borrow_mut().handle_action(action);
        Ok(())
    }

    /// Anomaly threshold slider. Returns false when the value was ignored.
    pub fn slider_changed(&self, value: f64) -> bool {
        self.inner.borrow_mut().slider_changed(value)
    }

    pub fn export_json(&self) -> Result<String, JsValue> {
        self.inner.borrow().export_json().map_err(js_error)
    }
}

impl WasmDashboard {
    fn clear_intervals(&mut self) {
        if self.intervals.is_empty() {
            return;
        }
        if let Some(window) = web_sys::window() {
            for interval in &self.intervals {
                window.clear_interval_with_handle(interval.id);
            }
        }
        self.intervals.clear();
        log::info!("timers cleared");
    }
}

impl Drop for WasmDashboard {
    fn drop(&mut self) {
        self.stop();
    }
}
