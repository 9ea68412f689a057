use std::collections::BTreeMap;

use chrono::{Local, TimeZone};
use qshield_core::{
    Dashboard, DashboardBuilder, ManualClock, MemoryCharts, MemorySurface, page_containers,
};

use crate::DashboardArgs;

/// Seed used when `--seed-value` is not given, so snapshots are reproducible.
const DEFAULT_SEED: u64 = 0x5eed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Mutation,
    Chart,
    Event,
}

impl Timer {
    fn name(self) -> &'static str {
        match self {
            Self::Mutation => "mutation",
            Self::Chart => "chart",
            Self::Event => "event",
        }
    }
}

pub fn run(args: &DashboardArgs, ticks: u32, view: &str, with_surface: bool) {
    let view = super::parse_view(view);
    let config = super::load_config(args);
    let seed = super::load_seed(args.seed_file.as_deref());
    let clock = match Local.with_ymd_and_hms(2026, 1, 15, 14, 0, 0).single() {
        Some(start) => ManualClock::new(start),
        None => super::fail("cannot build the simulation start time"),
    };

    let mut dashboard = DashboardBuilder::new(config)
        .seed_data(seed)
        .rng_seed(args.seed_value.unwrap_or(DEFAULT_SEED))
        .clock(clock.clone())
        .build(
            MemorySurface::with_containers(page_containers()),
            MemoryCharts::new(),
        )
        .unwrap_or_else(|e| super::fail(e));
    dashboard.select_view(view);

    let fired = simulate(&mut dashboard, &clock, ticks);
    log::info!("simulated {ticks} chart periods: {fired:?}");

    let snapshot = dashboard.snapshot();
    dashboard.teardown();
    if with_surface {
        super::print_json(&serde_json::json!({
            "ticks": fired,
            "snapshot": snapshot,
            "surface": dashboard.surface(),
        }));
    } else {
        super::print_json(&serde_json::json!({
            "ticks": fired,
            "snapshot": snapshot,
        }));
    }
}

/// Fire every timer due within `ticks` chart periods, in time order, on the
/// manual clock. Timers due at the same instant fire mutation, chart, event.
fn simulate(
    dashboard: &mut Dashboard<MemorySurface, MemoryCharts>,
    clock: &ManualClock,
    ticks: u32,
) -> BTreeMap<&'static str, u64> {
    let config = dashboard.config();
    let horizon = config.chart_period_ms.saturating_mul(u64::from(ticks));
    let mut timers = [
        (Timer::Mutation, config.mutation_period_ms, config.mutation_period_ms),
        (Timer::Chart, config.chart_period_ms, config.chart_period_ms),
        (Timer::Event, config.event_period_ms, config.event_period_ms),
    ];

    let mut fired: BTreeMap<&'static str, u64> =
        timers.iter().map(|(t, _, _)| (t.name(), 0)).collect();
    let mut now_ms = 0u64;
    loop {
        let Some(next) = timers.iter_mut().min_by_key(|(_, _, due)| *due) else {
            break;
        };
        if next.2 > horizon {
            break;
        }
        let (timer, period, due) = *next;
        next.2 = due.saturating_add(period);

        let step = due - now_ms;
        if step > 0 {
            clock.advance(chrono::Duration::milliseconds(step as i64));
            now_ms = due;
        }
        match timer {
            Timer::Mutation => {
                dashboard.mutation_tick();
            }
            Timer::Chart => {
                dashboard.chart_tick();
            }
            Timer::Event => {
                dashboard.event_tick();
            }
        }
        *fired.entry(timer.name()).or_insert(0) += 1;
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use qshield_core::DashboardConfig;

    fn dashboard(clock: &ManualClock) -> Dashboard<MemorySurface, MemoryCharts> {
        DashboardBuilder::new(DashboardConfig::default())
            .rng_seed(DEFAULT_SEED)
            .clock(clock.clone())
            .build(
                MemorySurface::with_containers(page_containers()),
                MemoryCharts::new(),
            )
            .unwrap()
    }

    fn start() -> ManualClock {
        ManualClock::new(Local.with_ymd_and_hms(2026, 1, 15, 14, 0, 0).unwrap())
    }

    #[test]
    fn timers_fire_in_proportion_to_their_periods() {
        let clock = start();
        let mut d = dashboard(&clock);
        // 15 chart periods of 2s = 30s: 6 mutations, 15 chart ticks, 2 events.
        let fired = simulate(&mut d, &clock, 15);
        assert_eq!(fired["mutation"], 6);
        assert_eq!(fired["chart"], 15);
        assert_eq!(fired["event"], 2);
        assert_eq!(d.now(), Local.with_ymd_and_hms(2026, 1, 15, 14, 0, 30).unwrap());
    }

    #[test]
    fn same_seed_gives_same_snapshot() {
        let run = || {
            let clock = start();
            let mut d = dashboard(&clock);
            simulate(&mut d, &clock, 8);
            serde_json::to_string(&d.snapshot()).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn zero_ticks_fires_nothing() {
        let clock = start();
        let mut d = dashboard(&clock);
        let fired = simulate(&mut d, &clock, 0);
        assert!(fired.values().all(|&n| n == 0));
    }
}
