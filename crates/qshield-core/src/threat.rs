//! Threat events and the bounded, newest-first threat log.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Known threat categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    QuantumInterception,
    SignalJamming,
    ManInTheMiddle,
    SignalSpoofing,
    CyberIntrusion,
    Eavesdropping,
}

impl ThreatType {
    pub const ALL: [Self; 6] = [
        Self::QuantumInterception,
        Self::SignalJamming,
        Self::ManInTheMiddle,
        Self::SignalSpoofing,
        Self::CyberIntrusion,
        Self::Eavesdropping,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::QuantumInterception => "Quantum Interception",
            Self::SignalJamming => "Signal Jamming",
            Self::ManInTheMiddle => "MITM Attack",
            Self::SignalSpoofing => "Signal Spoofing",
            Self::CyberIntrusion => "Cyber Intrusion",
            Self::Eavesdropping => "Eavesdropping Attempt",
        }
    }
}

/// Platform class a threat targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    Satellite,
    Naval,
    Airborne,
    Ground,
}

impl PlatformKind {
    pub const ALL: [Self; 4] = [Self::Satellite, Self::Naval, Self::Airborne, Self::Ground];

    pub fn label(self) -> &'static str {
        match self {
            Self::Satellite => "Satellite",
            Self::Naval => "Naval",
            Self::Airborne => "Airborne",
            Self::Ground => "Ground",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// CSS-style class used by the display surface.
    pub fn class(self) -> &'static str {
        match self {
            Self::Low => "severity-low",
            Self::Medium => "severity-medium",
            Self::High => "severity-high",
        }
    }
}

/// Disposition of a threat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatStatus {
    Blocked,
    Investigating,
    Neutralized,
    Monitoring,
    Breached,
}

impl ThreatStatus {
    /// Statuses the synthetic feed draws from. `Breached` only comes from a
    /// compromised classical uplink.
    pub const FEED: [Self; 4] = [
        Self::Blocked,
        Self::Investigating,
        Self::Neutralized,
        Self::Monitoring,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Blocked => "Blocked",
            Self::Investigating => "Investigating",
            Self::Neutralized => "Neutralized",
            Self::Monitoring => "Monitoring",
            Self::Breached => "Breached",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    )*};
}

display_via_label!(ThreatType, PlatformKind, Severity, ThreatStatus);

/// One immutable threat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEvent {
    /// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub threat_type: ThreatType,
    pub platform: PlatformKind,
    pub severity: Severity,
    pub status: ThreatStatus,
}

impl ThreatEvent {
    /// Time-of-day part of the timestamp for compact rows.
    pub fn time_of_day(&self) -> &str {
        self.timestamp
            .rsplit_once(' ')
            .map_or(self.timestamp.as_str(), |(_, t)| t)
    }
}

/// Newest-first threat list with a hard capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatLog {
    capacity: usize,
    events: VecDeque<ThreatEvent>,
    total: u64,
}

impl ThreatLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::new(),
            total: 0,
        }
    }

    /// Load seed events given newest-first. Extra events beyond capacity are dropped
    /// from the old end.
    pub fn seed(&mut self, events: impl IntoIterator<Item = ThreatEvent>) {
        for event in events {
            self.events.push_back(event);
            self.total += 1;
        }
        self.events.truncate(self.capacity);
    }

    /// Insert at the head; evicts the oldest (tail) entry when over capacity.
    /// Returns the evicted event, if any.
    pub fn insert(&mut self, event: ThreatEvent) -> Option<ThreatEvent> {
        self.events.push_front(event);
        self.total += 1;
        if self.events.len() > self.capacity {
            self.events.pop_back()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events ever recorded, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ThreatEvent> {
        self.events.iter()
    }

    pub fn newest(&self) -> Option<&ThreatEvent> {
        self.events.front()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.events.iter().filter(|e| e.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(n: u32) -> ThreatEvent {
        ThreatEvent {
            timestamp: format!("2026-01-01 00:00:{n:02}"),
            threat_type: ThreatType::ALL[n as usize % ThreatType::ALL.len()],
            platform: PlatformKind::ALL[n as usize % PlatformKind::ALL.len()],
            severity: Severity::ALL[n as usize % Severity::ALL.len()],
            status: ThreatStatus::FEED[n as usize % ThreatStatus::FEED.len()],
        }
    }

    #[test]
    fn eleventh_insert_evicts_oldest_only() {
        let mut log = ThreatLog::new(10);
        for n in 1..=10 {
            assert!(log.insert(event(n)).is_none());
        }
        let evicted = log.insert(event(11)).expect("eviction");
        assert_eq!(evicted, event(1));
        assert_eq!(log.len(), 10);
        let stamps: Vec<_> = log.iter().map(|e| e.time_of_day().to_string()).collect();
        let expected: Vec<_> = (2..=11).rev().map(|n| format!("00:00:{n:02}")).collect();
        assert_eq!(stamps, expected);
    }

    #[test]
    fn twelve_inserts_keep_three_through_twelve() {
        let mut log = ThreatLog::new(10);
        for n in 1..=12 {
            log.insert(event(n));
        }
        assert_eq!(log.len(), 10);
        assert_eq!(log.newest(), Some(&event(12)));
        assert_eq!(log.iter().last(), Some(&event(3)));
        assert_eq!(log.total(), 12);
    }

    #[test]
    fn seed_truncates_to_capacity() {
        let mut log = ThreatLog::new(2);
        log.seed([event(9), event(8), event(7)]);
        assert_eq!(log.len(), 2);
        assert_eq!(log.newest(), Some(&event(9)));
    }

    #[test]
    fn unbounded_capacity_allocates_lazily() {
        let mut log = ThreatLog::new(usize::MAX);
        log.insert(event(1));
        assert_eq!(log.capacity(), usize::MAX);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn labels_render_through_display() {
        assert_eq!(ThreatType::ManInTheMiddle.to_string(), "MITM Attack");
        assert_eq!(Severity::High.to_string(), "High");
        assert!(Severity::High > Severity::Low);
    }
}
