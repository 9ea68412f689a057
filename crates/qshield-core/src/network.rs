//! QKD protocols and defense platforms shown in the network views.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::threat::PlatformKind;

/// QBER above which a QKD session is aborted and its keys discarded.
pub const QBER_ABORT_THRESHOLD: f64 = 0.11;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub name: String,
    pub key_rate_kbps: f64,
    /// Quantum bit error rate as a fraction.
    pub qber: f64,
    pub status: String,
}

impl Protocol {
    pub fn is_secure(&self) -> bool {
        self.qber < QBER_ABORT_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformStatus {
    Secure,
    Monitoring,
    Alert,
    Offline,
}

impl PlatformStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Secure => "Secure",
            Self::Monitoring => "Monitoring",
            Self::Alert => "Alert",
            Self::Offline => "Offline",
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Secure => "status-secure",
            Self::Monitoring => "status-monitoring",
            Self::Alert => "status-alert",
            Self::Offline => "status-offline",
        }
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefensePlatform {
    pub name: String,
    pub kind: PlatformKind,
    pub status: PlatformStatus,
    /// Link description, e.g. "QKD / E91".
    pub link: String,
    pub qrng_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_security_follows_qber_threshold() {
        let mut p = Protocol {
            name: "BB84".into(),
            key_rate_kbps: 1.2,
            qber: 0.02,
            status: "Active".into(),
        };
        assert!(p.is_secure());
        p.qber = QBER_ABORT_THRESHOLD;
        assert!(!p.is_secure());
    }

    #[test]
    fn status_serializes_as_variant_name() {
        let json = serde_json::to_string(&PlatformStatus::Monitoring).unwrap();
        assert_eq!(json, "\"Monitoring\"");
        assert_eq!(PlatformStatus::Alert.to_string(), "Alert");
    }
}
