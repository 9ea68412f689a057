//! CLI for Quantum Shield, a live defense-communications monitoring dashboard.

mod commands;
mod tui;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qshield")]
#[command(about = "Quantum Shield: simulated QKD, QRNG and threat telemetry dashboard")]
#[command(version = qshield_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that builds a dashboard.
#[derive(Args, Debug, Clone, Default)]
pub struct DashboardArgs {
    /// JSON config file (missing fields take their defaults)
    #[arg(long)]
    config: Option<String>,

    /// JSON seed dataset replacing the bundled one
    #[arg(long)]
    seed_file: Option<String>,

    /// Override the metric mutation period in milliseconds
    #[arg(long)]
    mutation_ms: Option<u64>,

    /// Override the chart refresh period in milliseconds
    #[arg(long)]
    chart_ms: Option<u64>,

    /// Override the threat event period in milliseconds
    #[arg(long)]
    event_ms: Option<u64>,

    /// Seed every random draw for a reproducible run
    #[arg(long)]
    seed_value: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live interactive dashboard (TUI)
    Monitor {
        #[command(flatten)]
        dashboard: DashboardArgs,

        /// View shown at startup
        #[arg(long, default_value = "overview")]
        view: String,
    },

    /// Run the timers headless, then print the final projection as JSON
    Run {
        #[command(flatten)]
        dashboard: DashboardArgs,

        /// Seconds to run (0 = until Ctrl+C)
        #[arg(long, default_value = "10")]
        duration: f64,

        /// View kept active while running
        #[arg(long, default_value = "analytics")]
        view: String,
    },

    /// Simulate a number of chart periods on a virtual clock and print the result
    Snapshot {
        #[command(flatten)]
        dashboard: DashboardArgs,

        /// Chart periods to simulate
        #[arg(long, default_value = "10")]
        ticks: u32,

        /// View active during the simulation
        #[arg(long, default_value = "analytics")]
        view: String,

        /// Also print the rendered display surface
        #[arg(long)]
        surface: bool,
    },

    /// Print the seed dataset as JSON
    Seed {
        /// Validate and print this file instead of the bundled dataset
        #[arg(long)]
        seed_file: Option<String>,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        dashboard: DashboardArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    // The TUI owns the terminal; only warnings may reach stderr there.
    let default_filter = match cli.command {
        Commands::Monitor { .. } => "warn",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Monitor { dashboard, view } => commands::monitor::run(&dashboard, &view),
        Commands::Run {
            dashboard,
            duration,
            view,
        } => commands::run::run(&dashboard, duration, &view),
        Commands::Snapshot {
            dashboard,
            ticks,
            view,
            surface,
        } => commands::snapshot::run(&dashboard, ticks, &view, surface),
        Commands::Seed { seed_file } => commands::seed::run(seed_file.as_deref()),
        Commands::Config { dashboard } => commands::config::run(&dashboard),
    }
}
