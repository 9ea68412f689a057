use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use qshield_core::Scheduler;

use crate::DashboardArgs;

pub fn run(args: &DashboardArgs, duration: f64, view: &str) {
    let limit = run_limit(duration).unwrap_or_else(|e| super::fail(e));
    let view = super::parse_view(view);
    let mut dashboard = super::build_dashboard(args);
    dashboard.select_view(view);
    let periods = {
        let c = dashboard.config();
        (c.mutation_period_ms, c.chart_period_ms, c.event_period_ms)
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("Ctrl+C handler not installed: {e}");
    }

    eprintln!("Running dashboard headless");
    eprintln!("  View:      {view}");
    eprintln!(
        "  Timers:    mutation {}ms, chart {}ms, event {}ms",
        periods.0, periods.1, periods.2
    );
    match limit {
        Some(d) => eprintln!("  Duration:  {:.1}s", d.as_secs_f64()),
        None => eprintln!("  Duration:  until Ctrl+C"),
    }

    let mut scheduler = Scheduler::start(Arc::new(Mutex::new(dashboard)));
    let start = Instant::now();
    while running.load(Ordering::SeqCst) {
        if let Some(max) = limit
            && start.elapsed() >= max
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    scheduler.shutdown();

    let ticks: BTreeMap<&str, u64> = scheduler.tick_counts().into_iter().collect();
    let shared = scheduler.dashboard();
    let d = shared.lock().unwrap_or_else(|e| e.into_inner());
    super::print_json(&serde_json::json!({
        "elapsed_secs": start.elapsed().as_secs_f64(),
        "ticks": ticks,
        "snapshot": d.snapshot(),
        "surface": d.surface(),
    }));
}

/// Wall-clock limit for `--duration`; `None` runs until Ctrl+C.
fn run_limit(duration: f64) -> Result<Option<Duration>, String> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(format!("invalid --duration {duration}"));
    }
    if duration == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(duration)
        .map(Some)
        .map_err(|e| format!("invalid --duration {duration}: {e}"))
}
