//! View activation controller.
//!
//! Per view: Inactive -> Active(uninitialized) -> Active(initialized). Only one
//! view is active at a time. Chart resources for a view are built the first
//! time it is activated and never again; later activations only refresh data.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chart::{ChartHandle, ChartId};
use crate::error::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Overview,
    Qkd,
    Qrng,
    Threats,
    Analytics,
}

impl View {
    pub const ALL: [Self; 5] = [
        Self::Overview,
        Self::Qkd,
        Self::Qrng,
        Self::Threats,
        Self::Analytics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Qkd => "qkd",
            Self::Qrng => "qrng",
            Self::Threats => "threats",
            Self::Analytics => "analytics",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Qkd => "QKD Network",
            Self::Qrng => "QRNG",
            Self::Threats => "Threats",
            Self::Analytics => "AI Analytics",
        }
    }

    /// Id of the container holding this view.
    pub fn container(self) -> &'static str {
        match self {
            Self::Overview => "overview-view",
            Self::Qkd => "qkd-view",
            Self::Qrng => "qrng-view",
            Self::Threats => "threats-view",
            Self::Analytics => "analytics-view",
        }
    }

    /// Charts built lazily on first activation.
    pub fn charts(self) -> &'static [ChartId] {
        match self {
            Self::Overview | Self::Qkd => &[],
            Self::Qrng => &[ChartId::Entropy],
            Self::Threats => &[ChartId::Detection],
            Self::Analytics => &[ChartId::Anomaly, ChartId::Performance],
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownView(s.to_string()))
    }
}

/// A constructed chart plus how many of its buffer's rows were pushed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartBinding {
    pub id: ChartId,
    pub handle: ChartHandle,
    pub pushed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewVisualState {
    pub initialized: bool,
    pub charts: Vec<ChartBinding>,
}

/// What an activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// First activation built the view's charts.
    Initialized,
    /// Charts already exist; nothing was rebuilt.
    AlreadyInitialized,
    /// The view has no chart resources.
    NoResources,
    /// The initializer could not build; retried on the next activation.
    Deferred,
    /// Resources were released; activation only switches the visible view.
    TornDown,
}

#[derive(Debug, Clone, Default)]
pub struct ViewController {
    active: Option<View>,
    states: BTreeMap<View, ViewVisualState>,
    initializations: BTreeMap<View, u32>,
    torn_down: bool,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<View> {
        self.active
    }

    pub fn is_active(&self, view: View) -> bool {
        self.active == Some(view)
    }

    pub fn state(&self, view: View) -> Option<&ViewVisualState> {
        self.states.get(&view)
    }

    pub fn is_initialized(&self, view: View) -> bool {
        self.states.get(&view).is_some_and(|s| s.initialized)
    }

    /// Times the initializer ran successfully for `view`.
    pub fn initializations(&self, view: View) -> u32 {
        self.initializations.get(&view).copied().unwrap_or(0)
    }

    /// Make `view` the only active view, running `init` if it still needs
    /// its charts. `init` returns `None` when it could not build them.
    pub fn activate<F>(&mut self, view: View, init: F) -> Activation
    where
        F: FnOnce(View) -> Option<Vec<ChartBinding>>,
    {
        self.active = Some(view);
        if self.torn_down {
            return Activation::TornDown;
        }
        if view.charts().is_empty() {
            return Activation::NoResources;
        }
        let state = self.states.entry(view).or_default();
        if state.initialized {
            return Activation::AlreadyInitialized;
        }
        match init(view) {
            Some(charts) => {
                state.initialized = true;
                state.charts = charts;
                *self.initializations.entry(view).or_insert(0) += 1;
                Activation::Initialized
            }
            None => Activation::Deferred,
        }
    }

    /// Every live chart binding across initialized views.
    pub fn bindings_mut(&mut self) -> impl Iterator<Item = &mut ChartBinding> {
        self.states.values_mut().flat_map(|s| s.charts.iter_mut())
    }

    pub fn bindings(&self) -> impl Iterator<Item = &ChartBinding> {
        self.states.values().flat_map(|s| s.charts.iter())
    }

    /// Release all chart handles. Second and later calls return nothing.
    pub fn teardown(&mut self) -> Vec<ChartHandle> {
        self.torn_down = true;
        let mut handles = Vec::new();
        for state in self.states.values_mut() {
            handles.extend(state.charts.drain(..).map(|b| b.handle));
            state.initialized = false;
        }
        handles
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(view: View) -> Option<Vec<ChartBinding>> {
        Some(
            view.charts()
                .iter()
                .enumerate()
                .map(|(i, &id)| ChartBinding {
                    id,
                    handle: ChartHandle::new(i as u64 + 1),
                    pushed: 0,
                })
                .collect(),
        )
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("Analytics".parse::<View>().unwrap(), View::Analytics);
        assert_eq!(" QRNG ".parse::<View>().unwrap(), View::Qrng);
        assert!(matches!("radar".parse::<View>(), Err(Error::UnknownView(_))));
    }

    #[test]
    fn repeated_activation_initializes_once() {
        let mut views = ViewController::new();
        let mut calls = 0;
        for _ in 0..5 {
            views.activate(View::Analytics, |v| {
                calls += 1;
                bind(v)
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(views.initializations(View::Analytics), 1);
        assert_eq!(views.bindings().count(), 2);
    }

    #[test]
    fn activation_is_exclusive() {
        let mut views = ViewController::new();
        views.activate(View::Qrng, bind);
        views.activate(View::Threats, bind);
        assert!(views.is_active(View::Threats));
        assert!(!views.is_active(View::Qrng));
        // switching away keeps the earlier view's charts
        assert!(views.is_initialized(View::Qrng));
    }

    #[test]
    fn failed_init_is_retried_later() {
        let mut views = ViewController::new();
        assert_eq!(views.activate(View::Qrng, |_| None), Activation::Deferred);
        assert!(views.is_active(View::Qrng));
        assert_eq!(views.activate(View::Qrng, bind), Activation::Initialized);
        assert_eq!(views.activate(View::Qrng, bind), Activation::AlreadyInitialized);
    }

    #[test]
    fn views_without_charts_never_call_init() {
        let mut views = ViewController::new();
        let outcome = views.activate(View::Overview, |_| panic!("no charts to build"));
        assert_eq!(outcome, Activation::NoResources);
    }

    #[test]
    fn teardown_releases_once() {
        let mut views = ViewController::new();
        views.activate(View::Analytics, bind);
        views.activate(View::Qrng, bind);
        assert_eq!(views.teardown().len(), 3);
        assert!(views.teardown().is_empty());
        assert_eq!(
            views.activate(View::Analytics, |_| panic!("rebuilt after teardown")),
            Activation::TornDown
        );
    }

    #[test]
    fn next_cycles_through_all_views() {
        let mut v = View::Overview;
        for _ in 0..View::ALL.len() {
            v = v.next();
        }
        assert_eq!(v, View::Overview);
    }
}
