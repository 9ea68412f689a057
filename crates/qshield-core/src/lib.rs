//! # qshield-core
//!
//! **Real-time state and rendering engine for the Quantum Shield dashboard.**
//!
//! Everything the dashboard shows is simulated: scalar metrics drift on a
//! bounded random walk, threat events are synthesized from closed
//! enumerations, and QRNG output is pseudo-random bytes scored by the
//! `qshield-tests` battery. No cryptography or quantum computation happens.
//!
//! ## Quick Start
//!
//! ```
//! use qshield_core::{
//!     DashboardBuilder, DashboardConfig, MemoryCharts, MemorySurface, View, page_containers,
//! };
//!
//! let surface = MemorySurface::with_containers(page_containers());
//! let mut dashboard = DashboardBuilder::new(DashboardConfig::default())
//!     .rng_seed(7)
//!     .build(surface, MemoryCharts::new())
//!     .unwrap();
//!
//! dashboard.select_view(View::Analytics);
//! dashboard.mutation_tick();
//! dashboard.chart_tick();
//! assert_eq!(dashboard.surface().children("platform-list").len(), 4);
//! dashboard.teardown();
//! ```
//!
//! ## Architecture
//!
//! Seed data → model (metrics store, threat log, series buffers) → render
//! synchronizer → display surface / charts
//!
//! Three timers drive the model: metric mutation, chart refresh and the event
//! feed. Views build their charts lazily the first time they are shown. The
//! display and chart layers are traits ([`DisplaySurface`], [`ChartBackend`])
//! so the same engine runs against the DOM, a terminal UI or plain memory.

pub mod actions;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod mutation;
pub mod network;
pub mod notify;
pub mod qrng;
pub mod render;
#[cfg(not(target_arch = "wasm32"))]
pub mod scheduler;
pub mod seed;
pub mod series;
pub mod threat;
pub mod uplink;
pub mod view;

pub use actions::Action;
pub use chart::{ChartBackend, ChartHandle, ChartId, ChartKind, ChartSpec, MemoryCharts};
pub use config::{AnomalyConfig, DashboardConfig, WalkBounds};
pub use dashboard::{ActionOutcome, Dashboard, DashboardBuilder, DashboardSnapshot};
pub use display::{DisplaySurface, Element, MemorySurface};
pub use error::{Error, Result, SurfaceError};
pub use feed::{Clock, EventFeed, ManualClock, SystemClock};
pub use metrics::{MetricsDelta, MetricsSnapshot, MetricsStore};
pub use mutation::{DeltaSource, MutationEngine, RandomWalk, ScriptedDeltas};
pub use network::{DefensePlatform, PlatformStatus, Protocol};
pub use notify::{Level, Notification, Notifications};
pub use qrng::QrngMetrics;
pub use render::{SyncReport, page_containers};
#[cfg(not(target_arch = "wasm32"))]
pub use scheduler::{Scheduler, SharedDashboard};
pub use seed::SeedData;
pub use series::{SeriesBuffer, SeriesPoint, SeriesSet};
pub use threat::{PlatformKind, Severity, ThreatEvent, ThreatLog, ThreatStatus, ThreatType};
pub use uplink::{UplinkMode, UplinkReport, UplinkStatus};
pub use view::{Activation, View, ViewController};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
