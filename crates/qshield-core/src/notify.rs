//! Transient notifications, auto-dismissed after a fixed TTL.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Most notifications kept on screen at once.
pub const MAX_VISIBLE: usize = 5;

/// Longest time a notice may stay on screen.
pub const MAX_TTL: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Info,
    Warning,
    Alert,
}

impl Level {
    pub fn class(self) -> &'static str {
        match self {
            Self::Info => "notification notification-info",
            Self::Warning => "notification notification-warning",
            Self::Alert => "notification notification-alert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub message: String,
    pub level: Level,
    pub expires_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct Notifications {
    ttl: chrono::Duration,
    queue: VecDeque<Notification>,
}

impl Notifications {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl.min(MAX_TTL))
                .unwrap_or(chrono::Duration::seconds(3)),
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, level: Level, now: DateTime<Local>) {
        let message = message.into();
        log::debug!("notify [{level:?}] {message}");
        self.queue.push_back(Notification {
            message,
            level,
            // Only fails at the end of chrono's range; the notice then expires on the next prune.
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(now),
        });
        while self.queue.len() > MAX_VISIBLE {
            self.queue.pop_front();
        }
    }

    /// Drop expired notices; returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Local>) -> usize {
        let before = self.queue.len();
        self.queue.retain(|n| n.expires_at > now);
        before - self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.queue.back()
    }
}
