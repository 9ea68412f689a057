//! Fixed-capacity rolling series feeding the time-series charts.
//!
//! A series is one label column plus any number of parallel value columns.
//! Appending past capacity evicts the oldest row from every column at once, so
//! labels and values never drift out of alignment.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::chart::ChartId;
use crate::config::DashboardConfig;
use crate::seed::SeedSeries;

/// Rows kept by the charts whose capacity is not configurable.
pub const ENTROPY_CAPACITY: usize = 20;
pub const DETECTION_CAPACITY: usize = 12;
pub const PERFORMANCE_CAPACITY: usize = 12;

/// One row: a label plus one value per dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub values: Vec<f64>,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        Self {
            label: label.into(),
            values: values.into(),
        }
    }
}

/// FIFO-evicting multi-column buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesBuffer {
    capacity: usize,
    datasets: Vec<String>,
    labels: VecDeque<String>,
    values: Vec<VecDeque<f64>>,
    /// Total rows ever appended or seeded.
    appended: u64,
}

impl SeriesBuffer {
    /// Empty buffer with one column per dataset name. A zero capacity is bumped to one.
    pub fn new<S: Into<String>>(datasets: impl IntoIterator<Item = S>, capacity: usize) -> Self {
        let datasets: Vec<String> = datasets.into_iter().map(Into::into).collect();
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: vec![VecDeque::new(); datasets.len()],
            labels: VecDeque::new(),
            datasets,
            appended: 0,
        }
    }

    /// Bulk-load rows without eviction bookkeeping.
    ///
    /// Seed data is expected to fit; if it does not, only the newest `capacity`
    /// rows are kept.
    pub fn seed(&mut self, points: impl IntoIterator<Item = SeriesPoint>) {
        let points: Vec<SeriesPoint> = points.into_iter().collect();
        let skip = points.len().saturating_sub(self.capacity);
        if skip > 0 {
            log::debug!(
                "seed of {} rows exceeds capacity {}; keeping newest",
                points.len(),
                self.capacity
            );
        }
        self.appended += skip as u64;
        for point in points.into_iter().skip(skip) {
            self.push_row(point);
        }
        self.trim();
    }

    /// Append one row, evicting the oldest row when over capacity.
    pub fn append(&mut self, point: SeriesPoint) {
        self.push_row(point);
        self.trim();
    }

    fn push_row(&mut self, mut point: SeriesPoint) {
        point.values.resize(self.datasets.len(), 0.0);
        self.labels.push_back(point.label);
        for (column, value) in self.values.iter_mut().zip(point.values) {
            column.push_back(value);
        }
        self.appended += 1;
    }

    fn trim(&mut self) {
        while self.labels.len() > self.capacity {
            self.labels.pop_front();
            for column in &mut self.values {
                column.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn dataset_names(&self) -> &[String] {
        &self.datasets
    }

    pub fn labels(&self) -> &VecDeque<String> {
        &self.labels
    }

    pub fn dataset(&self, index: usize) -> Option<&VecDeque<f64>> {
        self.values.get(index)
    }

    pub fn row(&self, index: usize) -> Option<SeriesPoint> {
        let label = self.labels.get(index)?.clone();
        let values = self
            .values
            .iter()
            .map(|column| column.get(index).copied().unwrap_or(0.0))
            .collect();
        Some(SeriesPoint { label, values })
    }

    pub fn latest(&self) -> Option<SeriesPoint> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// All retained rows, oldest first.
    pub fn points(&self) -> impl Iterator<Item = SeriesPoint> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    /// Retained rows appended after the first `seen` rows, oldest first.
    pub fn points_since(&self, seen: u64) -> impl Iterator<Item = SeriesPoint> + '_ {
        let first_retained = self.appended - self.len() as u64;
        let start = seen.saturating_sub(first_retained).min(self.len() as u64) as usize;
        (start..self.len()).filter_map(|i| self.row(i))
    }
}

/// One buffer per dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSet {
    pub entropy: SeriesBuffer,
    pub detection: SeriesBuffer,
    pub anomaly: SeriesBuffer,
    pub performance: SeriesBuffer,
}

impl SeriesSet {
    pub fn new(config: &DashboardConfig, seed: &SeedSeries) -> Self {
        let mut set = Self {
            entropy: SeriesBuffer::new(["entropy"], ENTROPY_CAPACITY),
            detection: SeriesBuffer::new(["detected", "blocked"], DETECTION_CAPACITY),
            anomaly: SeriesBuffer::new(["score", "threshold"], config.anomaly_capacity),
            performance: SeriesBuffer::new(["cpu", "latency"], PERFORMANCE_CAPACITY),
        };
        set.entropy.seed(seed.entropy.iter().cloned());
        set.detection.seed(seed.detection.iter().cloned());
        set.anomaly.seed(seed.anomaly.iter().cloned());
        set.performance.seed(seed.performance.iter().cloned());
        set
    }

    pub fn get(&self, id: ChartId) -> &SeriesBuffer {
        match id {
            ChartId::Entropy => &self.entropy,
            ChartId::Detection => &self.detection,
            ChartId::Anomaly => &self.anomaly,
            ChartId::Performance => &self.performance,
        }
    }

    pub fn get_mut(&mut self, id: ChartId) -> &mut SeriesBuffer {
        match id {
            ChartId::Entropy => &mut self.entropy,
            ChartId::Detection => &mut self.detection,
            ChartId::Anomaly => &mut self.anomaly,
            ChartId::Performance => &mut self.performance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(i: usize) -> SeriesPoint {
        SeriesPoint::new(format!("t{i}"), vec![i as f64, (i * 10) as f64])
    }

    #[test]
    fn append_past_capacity_evicts_in_lock_step() {
        let mut buf = SeriesBuffer::new(["score", "threshold"], 10);
        for i in 0..25 {
            buf.append(point(i));
            assert!(buf.len() <= 10);
            assert_eq!(buf.labels().len(), buf.dataset(0).unwrap().len());
            assert_eq!(buf.labels().len(), buf.dataset(1).unwrap().len());
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.labels().front().map(String::as_str), Some("t15"));
        assert_eq!(buf.dataset(0).unwrap().front().copied(), Some(15.0));
        assert_eq!(buf.dataset(1).unwrap().back().copied(), Some(240.0));
        assert_eq!(buf.appended(), 25);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let mut buf = SeriesBuffer::new(["a", "b"], 4);
        buf.append(SeriesPoint::new("x", vec![1.0]));
        buf.append(SeriesPoint::new("y", vec![1.0, 2.0, 3.0]));
        assert_eq!(buf.dataset(1).unwrap().iter().copied().collect::<Vec<_>>(), vec![0.0, 2.0]);
        assert_eq!(buf.dataset(0).unwrap().len(), 2);
    }

    #[test]
    fn unbounded_capacity_allocates_lazily() {
        let mut buf = SeriesBuffer::new(["score", "threshold"], usize::MAX);
        buf.append(point(1));
        assert_eq!(buf.capacity(), usize::MAX);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn oversized_seed_keeps_newest() {
        let mut buf = SeriesBuffer::new(["v"], 3);
        buf.seed((0..5).map(|i| SeriesPoint::new(format!("s{i}"), vec![i as f64])));
        let labels: Vec<_> = buf.labels().iter().cloned().collect();
        assert_eq!(labels, vec!["s2", "s3", "s4"]);
        assert_eq!(buf.appended(), 5);
    }

    #[test]
    fn points_since_returns_only_new_rows() {
        let mut buf = SeriesBuffer::new(["v"], 3);
        buf.seed([SeriesPoint::new("a", vec![1.0]), SeriesPoint::new("b", vec![2.0])]);
        let seen = buf.appended();
        assert_eq!(buf.points_since(seen).count(), 0);
        buf.append(SeriesPoint::new("c", vec![3.0]));
        buf.append(SeriesPoint::new("d", vec![4.0]));
        let fresh: Vec<_> = buf.points_since(seen).map(|p| p.label).collect();
        assert_eq!(fresh, vec!["c", "d"]);
        // far behind: only what is still retained
        let all: Vec<_> = buf.points_since(0).map(|p| p.label).collect();
        assert_eq!(all, vec!["b", "c", "d"]);
    }

    #[test]
    fn series_set_seeds_from_builtin() {
        let seed = crate::seed::SeedData::builtin();
        let set = SeriesSet::new(&DashboardConfig::default(), &seed.series);
        assert_eq!(set.get(ChartId::Anomaly).len(), 10);
        assert_eq!(set.get(ChartId::Anomaly).capacity(), 10);
        assert_eq!(set.get(ChartId::Detection).dataset_names(), ["detected", "blocked"]);
    }

    #[test]
    fn latest_row() {
        let mut buf = SeriesBuffer::new(["v"], 2);
        assert!(buf.latest().is_none());
        buf.append(SeriesPoint::new("a", vec![1.5]));
        assert_eq!(buf.latest(), Some(SeriesPoint::new("a", vec![1.5])));
    }
}
