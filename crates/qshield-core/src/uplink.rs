//! Simulated secure uplink. No cryptography happens here; the outcome and its
//! phase log follow fixed rules per mode and attack flag.

use std::fmt;

use serde::Serialize;

use crate::network::QBER_ABORT_THRESHOLD;
use crate::threat::{PlatformKind, Severity, ThreatEvent, ThreatStatus, ThreatType};

/// QBER on a clean quantum channel (0.01%).
pub const CLEAN_QBER: f64 = 0.0001;
/// QBER once an interceptor measures photons.
pub const INTERCEPT_QBER: f64 = 0.27;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UplinkMode {
    Quantum,
    Classical,
}

impl fmt::Display for UplinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quantum => "quantum",
            Self::Classical => "classical",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UplinkStatus {
    Success,
    /// Interception detected and the link severed before keys were used.
    Defended,
    Compromised,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    pub stage: &'static str,
    pub detail: String,
}

fn phase(stage: &'static str, detail: impl Into<String>) -> Phase {
    Phase {
        stage,
        detail: detail.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UplinkReport {
    pub mode: UplinkMode,
    pub attack: bool,
    pub status: UplinkStatus,
    /// Only measured on the quantum channel.
    pub qber: Option<f64>,
    pub message: &'static str,
    pub phases: Vec<Phase>,
}

impl UplinkReport {
    /// The threat record an attacked transmission leaves behind.
    pub fn threat_event(&self, timestamp: String) -> Option<ThreatEvent> {
        if !self.attack {
            return None;
        }
        let (threat_type, platform) = match self.mode {
            UplinkMode::Quantum => (ThreatType::QuantumInterception, PlatformKind::Satellite),
            UplinkMode::Classical => (ThreatType::SignalJamming, PlatformKind::Ground),
        };
        let status = match self.status {
            UplinkStatus::Compromised => ThreatStatus::Breached,
            _ => ThreatStatus::Blocked,
        };
        Some(ThreatEvent {
            timestamp,
            threat_type,
            platform,
            severity: Severity::High,
            status,
        })
    }
}

/// Run one transmission through the fixed phase script.
pub fn transmit(mode: UplinkMode, attack: bool) -> UplinkReport {
    match mode {
        UplinkMode::Quantum => quantum(attack),
        UplinkMode::Classical => classical(attack),
    }
}

fn quantum(attack: bool) -> UplinkReport {
    let mut phases = vec![
        phase("HARDWARE", "QRNG module active"),
        phase("ENTROPY", "source stability 99.99%"),
        phase("LINK", "E91 entanglement distribution to SAT-01"),
        phase("SYNC", "polarization bases aligned"),
    ];
    if attack {
        phases.push(phase(
            "QBER",
            format!(
                "{:.0}% exceeds {:.0}% abort threshold",
                INTERCEPT_QBER * 100.0,
                QBER_ABORT_THRESHOLD * 100.0
            ),
        ));
        phases.push(phase("COUNTERMEASURE", "keys discarded, link severed"));
        return UplinkReport {
            mode: UplinkMode::Quantum,
            attack,
            status: UplinkStatus::Defended,
            qber: Some(INTERCEPT_QBER),
            message: "Hostile intercept detected. Keys discarded.",
            phases,
        };
    }
    phases.push(phase("QBER", format!("{:.2}% (secure channel)", CLEAN_QBER * 100.0)));
    phases.push(phase("KEYS", "shared secret established"));
    phases.push(phase("ENCRYPT", "AES-256-GCM with quantum key"));
    UplinkReport {
        mode: UplinkMode::Quantum,
        attack,
        status: UplinkStatus::Success,
        qber: Some(CLEAN_QBER),
        message: "Intel secured. Uplink complete.",
        phases,
    }
}

fn classical(attack: bool) -> UplinkReport {
    let mut phases = vec![phase("PROTOCOL", "standard VHF/UHF radio link")];
    if attack {
        phases.push(phase("JAMMING", "signal intercepted"));
        phases.push(phase("DECRYPTION", "static key recovered by adversary"));
        return UplinkReport {
            mode: UplinkMode::Classical,
            attack,
            status: UplinkStatus::Compromised,
            qber: None,
            message: "Signal intercepted. Intel leaked.",
            phases,
        };
    }
    phases.push(phase("STATUS", "delivered at standard risk"));
    UplinkReport {
        mode: UplinkMode::Classical,
        attack,
        status: UplinkStatus::Success,
        qber: None,
        message: "Radio transmission complete.",
        phases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_table() {
        let cases = [
            (UplinkMode::Quantum, false, UplinkStatus::Success),
            (UplinkMode::Quantum, true, UplinkStatus::Defended),
            (UplinkMode::Classical, false, UplinkStatus::Success),
            (UplinkMode::Classical, true, UplinkStatus::Compromised),
        ];
        for (mode, attack, expected) in cases {
            let report = transmit(mode, attack);
            assert_eq!(report.status, expected, "{mode} attack={attack}");
            assert!(!report.phases.is_empty());
        }
    }

    #[test]
    fn intercepted_qber_crosses_abort_threshold() {
        let report = transmit(UplinkMode::Quantum, true);
        assert!(report.qber.unwrap() > QBER_ABORT_THRESHOLD);
        assert!(transmit(UplinkMode::Quantum, false).qber.unwrap() < QBER_ABORT_THRESHOLD);
        assert!(transmit(UplinkMode::Classical, true).qber.is_none());
    }

    #[test]
    fn attacks_leave_high_severity_events() {
        let ts = "2026-01-01 00:00:00".to_string();
        let defended = transmit(UplinkMode::Quantum, true).threat_event(ts.clone()).unwrap();
        assert_eq!(defended.status, ThreatStatus::Blocked);
        assert_eq!(defended.severity, Severity::High);
        let breached = transmit(UplinkMode::Classical, true).threat_event(ts.clone()).unwrap();
        assert_eq!(breached.status, ThreatStatus::Breached);
        assert!(transmit(UplinkMode::Quantum, false).threat_event(ts).is_none());
    }
}
