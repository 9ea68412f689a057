//! Charting collaborator.
//!
//! The engine depends on four operations only: construct once, append a
//! point, redraw, destroy. [`MemoryCharts`] backs each chart with a
//! [`SeriesBuffer`] and counts calls so lazy-init and teardown can be checked.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::series::{SeriesBuffer, SeriesPoint};

/// The four time-series charts on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ChartId {
    Entropy,
    Detection,
    Anomaly,
    Performance,
}

impl ChartId {
    pub const ALL: [Self; 4] = [Self::Entropy, Self::Detection, Self::Anomaly, Self::Performance];

    /// Id of the container the chart is mounted in.
    pub fn container(self) -> &'static str {
        match self {
            Self::Entropy => "entropy-chart",
            Self::Detection => "detection-chart",
            Self::Anomaly => "anomaly-chart",
            Self::Performance => "performance-chart",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Entropy => "QRNG Entropy",
            Self::Detection => "Threat Detection",
            Self::Anomaly => "AI Anomaly Score",
            Self::Performance => "System Performance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStyle {
    pub label: String,
    pub color: String,
    pub fill: bool,
    pub dashed: bool,
}

impl DatasetStyle {
    pub fn line(label: &str, color: &str) -> Self {
        Self {
            label: label.to_string(),
            color: color.to_string(),
            fill: false,
            dashed: false,
        }
    }

    pub fn filled(mut self) -> Self {
        self.fill = true;
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Declarative chart configuration handed over at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: ChartId,
    pub kind: ChartKind,
    pub datasets: Vec<DatasetStyle>,
    /// Points the chart keeps; older points are evicted from the front.
    pub capacity: usize,
    pub y_range: Option<(f64, f64)>,
    pub animate: bool,
}

impl ChartSpec {
    /// Dashboard styling for `id`, keeping `capacity` points.
    pub fn for_chart(id: ChartId, capacity: usize) -> Self {
        let (kind, datasets, y_range) = match id {
            ChartId::Entropy => (
                ChartKind::Line,
                vec![DatasetStyle::line("entropy", "#00d4ff").filled()],
                Some((0.99, 1.0)),
            ),
            ChartId::Detection => (
                ChartKind::Bar,
                vec![
                    DatasetStyle::line("detected", "#ff4757"),
                    DatasetStyle::line("blocked", "#2ed573"),
                ],
                None,
            ),
            ChartId::Anomaly => (
                ChartKind::Line,
                vec![
                    DatasetStyle::line("score", "#ff4757").filled(),
                    DatasetStyle::line("threshold", "#ffa502").dashed(),
                ],
                Some((0.0, 1.0)),
            ),
            ChartId::Performance => (
                ChartKind::Line,
                vec![
                    DatasetStyle::line("cpu", "#00ff88"),
                    DatasetStyle::line("latency", "#a55eea"),
                ],
                Some((0.0, 100.0)),
            ),
        };
        Self {
            id,
            kind,
            datasets,
            capacity,
            y_range,
            animate: false,
        }
    }

    pub fn dataset_labels(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.label.as_str())
    }
}

/// Opaque handle returned by [`ChartBackend::construct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChartHandle(u64);

impl ChartHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

pub trait ChartBackend {
    /// Build a chart inside `container`. `None` when the container cannot host one.
    fn construct(&mut self, container: &str, spec: &ChartSpec) -> Option<ChartHandle>;
    fn append_point(&mut self, handle: ChartHandle, label: &str, values: &[f64]);
    fn redraw(&mut self, handle: ChartHandle);
    fn destroy(&mut self, handle: ChartHandle);
}

/// One live in-memory chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryChart {
    pub container: String,
    pub spec: ChartSpec,
    pub series: SeriesBuffer,
    pub redraws: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryCharts {
    next_handle: u64,
    live: BTreeMap<u64, MemoryChart>,
    constructed: BTreeMap<ChartId, u32>,
    destroyed: u32,
    /// Containers that refuse construction.
    unavailable: Vec<String>,
}

impl MemoryCharts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that returns `None` for the given containers.
    pub fn without<S: Into<String>>(containers: impl IntoIterator<Item = S>) -> Self {
        Self {
            unavailable: containers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn chart(&self, id: ChartId) -> Option<&MemoryChart> {
        self.live.values().find(|c| c.spec.id == id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Times a chart with this id was constructed.
    pub fn constructions(&self, id: ChartId) -> u32 {
        self.constructed.get(&id).copied().unwrap_or(0)
    }

    pub fn total_constructions(&self) -> u32 {
        self.constructed.values().sum()
    }

    pub fn destroyed(&self) -> u32 {
        self.destroyed
    }

    pub fn total_redraws(&self) -> u64 {
        self.live.values().map(|c| c.redraws).sum()
    }
}

impl ChartBackend for MemoryCharts {
    fn construct(&mut self, container: &str, spec: &ChartSpec) -> Option<ChartHandle> {
        if self.unavailable.iter().any(|c| c == container) {
            return None;
        }
        self.next_handle += 1;
        let chart = MemoryChart {
            container: container.to_string(),
            spec: spec.clone(),
            series: SeriesBuffer::new(spec.dataset_labels(), spec.capacity),
            redraws: 0,
        };
        self.live.insert(self.next_handle, chart);
        *self.constructed.entry(spec.id).or_insert(0) += 1;
        Some(ChartHandle(self.next_handle))
    }

    fn append_point(&mut self, handle: ChartHandle, label: &str, values: &[f64]) {
        if let Some(chart) = self.live.get_mut(&handle.0) {
            chart.series.append(SeriesPoint::new(label, values.to_vec()));
        }
    }

    fn redraw(&mut self, handle: ChartHandle) {
        if let Some(chart) = self.live.get_mut(&handle.0) {
            chart.redraws += 1;
        }
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if self.live.remove(&handle.0).is_some() {
            self.destroyed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: ChartId, capacity: usize) -> ChartSpec {
        ChartSpec {
            id,
            kind: ChartKind::Line,
            datasets: vec![
                DatasetStyle::line("score", "#ff4757").filled(),
                DatasetStyle::line("threshold", "#ffa502").dashed(),
            ],
            capacity,
            y_range: Some((0.0, 1.0)),
            animate: false,
        }
    }

    #[test]
    fn chart_keeps_capacity_points() {
        let mut charts = MemoryCharts::new();
        let h = charts.construct("anomaly-chart", &spec(ChartId::Anomaly, 3)).unwrap();
        for i in 0..5 {
            charts.append_point(h, &format!("t{i}"), &[i as f64 / 10.0, 0.7]);
        }
        charts.redraw(h);
        let chart = charts.chart(ChartId::Anomaly).unwrap();
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series.labels().front().map(String::as_str), Some("t2"));
        assert_eq!(chart.redraws, 1);
    }

    #[test]
    fn destroy_is_counted_once() {
        let mut charts = MemoryCharts::new();
        let h = charts.construct("entropy-chart", &spec(ChartId::Entropy, 5)).unwrap();
        charts.destroy(h);
        charts.destroy(h);
        assert_eq!(charts.destroyed(), 1);
        assert_eq!(charts.live_count(), 0);
        assert_eq!(charts.constructions(ChartId::Entropy), 1);
    }

    #[test]
    fn unavailable_container_refuses_construction() {
        let mut charts = MemoryCharts::without(["anomaly-chart"]);
        assert!(charts.construct("anomaly-chart", &spec(ChartId::Anomaly, 3)).is_none());
        assert_eq!(charts.total_constructions(), 0);
    }
}
