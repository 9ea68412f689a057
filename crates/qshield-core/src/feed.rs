//! Event feed engine: synthesizes threat events against a wall clock.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use rand::Rng;

use crate::threat::{PlatformKind, Severity, ThreatEvent, ThreatLog, ThreatStatus, ThreatType};

/// Timestamp layout for threat events.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Layout for chart labels.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// Wall-clock source.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Local>;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Local>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Draw one event with every field sampled independently.
pub fn synthesize_event<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Local>) -> ThreatEvent {
    ThreatEvent {
        timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        threat_type: pick(rng, &ThreatType::ALL),
        platform: pick(rng, &PlatformKind::ALL),
        severity: pick(rng, &Severity::ALL),
        status: pick(rng, &ThreatStatus::FEED),
    }
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

/// Owns the threat log; single writer for it.
#[derive(Debug, Clone)]
pub struct EventFeed {
    log: ThreatLog,
}

impl EventFeed {
    pub fn new(capacity: usize, seed: impl IntoIterator<Item = ThreatEvent>) -> Self {
        let mut log = ThreatLog::new(capacity);
        log.seed(seed);
        Self { log }
    }

    /// Synthesize one event, insert it at the head and return it.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, clock: &dyn Clock) -> ThreatEvent {
        let event = synthesize_event(rng, clock.now());
        self.insert(event.clone());
        event
    }

    pub fn insert(&mut self, event: ThreatEvent) {
        if let Some(evicted) = self.log.insert(event) {
            log::debug!("threat log full; evicted event from {}", evicted.timestamp);
        }
    }

    pub fn log(&self) -> &ThreatLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn event_is_stamped_with_clock_time() {
        let clock = ManualClock::new(start());
        let mut rng = StdRng::seed_from_u64(7);
        let event = synthesize_event(&mut rng, clock.now());
        assert_eq!(event.timestamp, "2026-03-14 09:26:53");
        assert_eq!(event.time_of_day(), "09:26:53");
        assert_ne!(event.status, ThreatStatus::Breached);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(start());
        let other = clock.clone();
        other.advance(chrono::Duration::seconds(15));
        assert_eq!(clock.now(), start() + chrono::Duration::seconds(15));
    }

    #[test]
    fn feed_tick_inserts_at_head_and_stays_bounded() {
        let clock = ManualClock::new(start());
        let mut rng = StdRng::seed_from_u64(1);
        let mut feed = EventFeed::new(10, []);
        for _ in 0..25 {
            let event = feed.tick(&mut rng, &clock);
            assert_eq!(feed.log().newest(), Some(&event));
            assert!(feed.log().len() <= 10);
            clock.advance(chrono::Duration::seconds(15));
        }
        assert_eq!(feed.log().len(), 10);
        assert_eq!(feed.log().total(), 25);
    }

    #[test]
    fn sampling_covers_every_category() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(synthesize_event(&mut rng, start()).threat_type);
        }
        assert_eq!(seen.len(), ThreatType::ALL.len());
    }
}
