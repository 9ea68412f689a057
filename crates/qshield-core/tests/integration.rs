//! Integration tests for qshield-core.
//!
//! These drive a whole dashboard through its public entry points:
//! seed → ticks and view selection → projection onto an in-memory page.

use chrono::{Local, TimeZone};
use qshield_core::render::ids;
use qshield_core::{
    Action, Activation, ChartId, Dashboard, DashboardBuilder, DashboardConfig, ManualClock,
    MemoryCharts, MemorySurface, MetricsDelta, PlatformStatus, ScriptedDeltas, SeedData, View,
    page_containers,
};

fn clock() -> ManualClock {
    ManualClock::new(Local.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap())
}

fn full_page() -> MemorySurface {
    MemorySurface::with_containers(page_containers())
}

fn dashboard(builder: DashboardBuilder) -> Dashboard<MemorySurface, MemoryCharts> {
    builder.build(full_page(), MemoryCharts::new()).unwrap()
}

#[test]
fn platform_list_shows_every_seeded_platform() {
    let d = dashboard(DashboardBuilder::new(DashboardConfig::default()).rng_seed(1));
    let rows = d.surface().children(ids::PLATFORM_LIST);
    assert_eq!(rows.len(), 4);
    for (row, platform) in rows.iter().zip(d.platforms()) {
        assert!(row.text.contains(&platform.name), "{}", row.text);
        assert!(row.text.contains(platform.status.label()), "{}", row.text);
    }
    let monitoring = rows
        .iter()
        .filter(|r| r.text.contains(PlatformStatus::Monitoring.label()))
        .count();
    assert_eq!(monitoring, 1);
}

#[test]
fn scripted_cpu_walk_is_projected_each_tick() {
    let mut d = dashboard(
        DashboardBuilder::new(DashboardConfig::default())
            .deltas(ScriptedDeltas::new([5, -5, 5].map(MetricsDelta::cpu)))
            .clock(clock()),
    );
    let mut shown = Vec::new();
    for _ in 0..3 {
        d.mutation_tick();
        shown.push(d.surface().text(ids::CPU_USAGE).unwrap().to_string());
    }
    assert_eq!(shown, ["72%", "67%", "72%"]);
    assert_eq!(d.surface().style(ids::CPU_BAR, "width"), Some("72%"));
}

#[test]
fn twelve_events_keep_the_newest_ten() {
    let c = clock();
    let seed = SeedData {
        threats: Vec::new(),
        ..SeedData::builtin()
    };
    let mut d = dashboard(
        DashboardBuilder::new(DashboardConfig::default())
            .seed_data(seed)
            .rng_seed(12)
            .clock(c.clone()),
    );

    let mut emitted = Vec::new();
    for _ in 0..12 {
        c.advance(chrono::Duration::seconds(1));
        emitted.push(d.event_tick().unwrap());
    }

    let log: Vec<_> = d.threats().iter().cloned().collect();
    let expected: Vec<_> = emitted[2..].iter().rev().cloned().collect();
    assert_eq!(log, expected);
    assert_eq!(d.threats().newest(), emitted.last());
    assert_eq!(d.surface().children(ids::THREAT_FEED).len(), 10);
    assert_eq!(d.surface().text(ids::THREAT_COUNT), Some("10"));
}

#[test]
fn adversarial_deltas_stay_clamped() {
    let deltas = [
        MetricsDelta {
            cpu_usage: i32::MAX,
            quantum_coherence: 50.0,
            network_latency: i32::MAX,
            security_score: i32::MAX,
        },
        MetricsDelta {
            cpu_usage: i32::MIN,
            quantum_coherence: f64::NAN,
            network_latency: i32::MIN,
            security_score: i32::MIN,
        },
    ];
    let mut d = dashboard(
        DashboardBuilder::new(DashboardConfig::default()).deltas(ScriptedDeltas::new(deltas)),
    );

    let high = d.mutation_tick();
    assert!(high.in_bounds());
    assert_eq!(d.surface().text(ids::CPU_USAGE), Some("100%"));
    assert_eq!(d.surface().text(ids::NETWORK_LATENCY), Some("30ms"));

    let low = d.mutation_tick();
    assert!(low.in_bounds());
    assert_eq!(low.quantum_coherence, high.quantum_coherence);
    assert_eq!(d.surface().text(ids::CPU_USAGE), Some("0%"));
    assert_eq!(d.surface().text(ids::SECURITY_SCORE), Some("90"));
}

#[test]
fn charts_are_built_once_per_view() {
    let mut d = dashboard(DashboardBuilder::new(DashboardConfig::default()).rng_seed(4));
    for view in [View::Analytics, View::Qrng, View::Analytics, View::Threats, View::Analytics] {
        d.select_view(view);
    }
    assert_eq!(d.charts().constructions(ChartId::Anomaly), 1);
    assert_eq!(d.charts().constructions(ChartId::Performance), 1);
    assert_eq!(d.charts().constructions(ChartId::Entropy), 1);
    assert_eq!(d.charts().constructions(ChartId::Detection), 1);
    assert_eq!(d.views().initializations(View::Analytics), 1);

    for view in View::ALL {
        let display = if view == View::Analytics { "block" } else { "none" };
        assert_eq!(d.surface().style(view.container(), "display"), Some(display));
    }
}

#[test]
fn repeated_sync_changes_nothing() {
    let mut d = dashboard(
        DashboardBuilder::new(DashboardConfig::default())
            .rng_seed(9)
            .clock(clock()),
    );
    d.select_view(View::Analytics);
    d.chart_tick();
    d.handle_action(Action::GenerateQrng);

    d.sync();
    let surface = d.surface().clone();
    let charts = d.charts().clone();

    let again = d.sync();
    assert_eq!(again.points_pushed, 0);
    assert_eq!(again.redraws, 0);
    assert_eq!(d.surface(), &surface);
    assert_eq!(d.charts(), &charts);
}

#[test]
fn missing_containers_are_skipped_not_fatal() {
    let mut page = full_page();
    page.remove_container(ids::CPU_USAGE);
    page.remove_container(View::Analytics.container());

    let mut d = DashboardBuilder::new(DashboardConfig::default())
        .rng_seed(2)
        .build(page, MemoryCharts::new())
        .unwrap();

    d.mutation_tick();
    assert!(d.last_sync().skipped.iter().any(|id| id == ids::CPU_USAGE));
    assert!(d.surface().text(ids::NETWORK_LATENCY).is_some());

    assert_eq!(d.select_view(View::Analytics), Activation::Deferred);
    assert_eq!(d.active_view(), Some(View::Analytics));
    assert_eq!(d.charts().live_count(), 0);

    d.surface_mut().add_container(View::Analytics.container());
    assert_eq!(d.select_view(View::Analytics), Activation::Initialized);
    assert_eq!(d.charts().live_count(), 2);
}

#[test]
fn partial_chart_failure_builds_nothing() {
    let mut d = DashboardBuilder::new(DashboardConfig::default())
        .rng_seed(2)
        .build(full_page(), MemoryCharts::without([ChartId::Performance.container()]))
        .unwrap();
    assert_eq!(d.select_view(View::Analytics), Activation::Deferred);
    assert_eq!(d.charts().live_count(), 0);
    assert_eq!(d.charts().destroyed(), 1);
    assert!(!d.views().is_initialized(View::Analytics));
}

#[test]
fn teardown_is_idempotent_and_stops_updates() {
    let mut d = dashboard(DashboardBuilder::new(DashboardConfig::default()).rng_seed(6));
    d.select_view(View::Analytics);
    d.select_view(View::Qrng);
    assert_eq!(d.charts().live_count(), 3);

    assert_eq!(d.teardown(), 3);
    assert_eq!(d.teardown(), 0);
    assert_eq!(d.charts().destroyed(), 3);
    assert_eq!(d.charts().live_count(), 0);

    let threats = d.threats().len();
    assert!(d.event_tick().is_none());
    assert!(d.chart_tick().is_none());
    assert_eq!(d.threats().len(), threats);
    assert_eq!(d.select_view(View::Threats), Activation::TornDown);
    assert_eq!(d.charts().total_constructions(), 3);
}

#[test]
fn unknown_names_are_rejected() {
    let mut d = dashboard(DashboardBuilder::new(DashboardConfig::default()).rng_seed(3));
    assert!(d.select_view_named("telemetry").is_err());
    assert_eq!(d.active_view(), Some(View::Overview));
    assert!("launch-missiles".parse::<Action>().is_err());
    assert_eq!(
        d.select_view_named("QRNG").unwrap(),
        Activation::Initialized
    );
}

#[test]
fn scheduler_shutdown_twice_releases_charts_once() {
    use std::sync::{Arc, Mutex};

    let config = DashboardConfig {
        mutation_period_ms: 5,
        chart_period_ms: 5,
        event_period_ms: 5,
        ..Default::default()
    };
    let mut d = dashboard(DashboardBuilder::new(config).rng_seed(8));
    d.select_view(View::Analytics);

    let mut scheduler = qshield_core::Scheduler::start(Arc::new(Mutex::new(d)));
    std::thread::sleep(std::time::Duration::from_millis(40));
    scheduler.shutdown();
    scheduler.shutdown();
    assert!(!scheduler.is_running());

    let shared = scheduler.dashboard();
    let d = shared.lock().unwrap();
    assert!(d.is_torn_down());
    assert_eq!(d.charts().destroyed(), 2);
}
