pub mod config;
pub mod monitor;
pub mod run;
pub mod seed;
pub mod snapshot;

use qshield_core::{
    Dashboard, DashboardBuilder, DashboardConfig, MemoryCharts, MemorySurface, SeedData, View,
    page_containers,
};

use crate::DashboardArgs;

/// Defaults, then the config file, then command-line overrides.
/// Exits the process on an unreadable or invalid config.
pub fn load_config(args: &DashboardArgs) -> DashboardConfig {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => DashboardConfig::default(),
    };
    if let Some(ms) = args.mutation_ms {
        config.mutation_period_ms = ms;
    }
    if let Some(ms) = args.chart_ms {
        config.chart_period_ms = ms;
    }
    if let Some(ms) = args.event_ms {
        config.event_period_ms = ms;
    }
    if let Err(e) = config.validate() {
        fail(e);
    }
    config
}

pub fn load_seed(path: Option<&str>) -> SeedData {
    match path {
        Some(path) => SeedData::load(path).unwrap_or_else(|e| fail(e)),
        None => SeedData::builtin(),
    }
}

/// Dashboard over a full in-memory page, with an RNG seed from the flag or the OS.
pub fn build_dashboard(args: &DashboardArgs) -> Dashboard<MemorySurface, MemoryCharts> {
    let config = load_config(args);
    let seed = load_seed(args.seed_file.as_deref());
    let rng_seed = args.seed_value.unwrap_or_else(rand::random);
    log::debug!("rng seed {rng_seed}");

    DashboardBuilder::new(config)
        .seed_data(seed)
        .rng_seed(rng_seed)
        .build(
            MemorySurface::with_containers(page_containers()),
            MemoryCharts::new(),
        )
        .unwrap_or_else(|e| fail(e))
}

pub fn parse_view(name: &str) -> View {
    name.parse().unwrap_or_else(|e| fail(e))
}

pub fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(e),
    }
}

pub fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("error: {e}");
    std::process::exit(1);
}
