//! User actions delivered by the interaction collaborator.

use std::str::FromStr;

use crate::error::Error;
use crate::uplink::UplinkMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GenerateQrng,
    ThreatScan,
    Transmit { mode: UplinkMode, attack: bool },
    ExportSnapshot,
}

impl Action {
    /// Canonical names accepted by [`FromStr`].
    pub const NAMES: [&'static str; 7] = [
        "generate-qrng",
        "threat-scan",
        "transmit-quantum",
        "transmit-quantum-attack",
        "transmit-classical",
        "transmit-classical-attack",
        "export-snapshot",
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GenerateQrng => Self::NAMES[0],
            Self::ThreatScan => Self::NAMES[1],
            Self::Transmit {
                mode: UplinkMode::Quantum,
                attack: false,
            } => Self::NAMES[2],
            Self::Transmit {
                mode: UplinkMode::Quantum,
                attack: true,
            } => Self::NAMES[3],
            Self::Transmit {
                mode: UplinkMode::Classical,
                attack: false,
            } => Self::NAMES[4],
            Self::Transmit {
                mode: UplinkMode::Classical,
                attack: true,
            } => Self::NAMES[5],
            Self::ExportSnapshot => Self::NAMES[6],
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    /// Accepts kebab or snake case, any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        let action = match key.as_str() {
            "generate-qrng" | "generate" => Self::GenerateQrng,
            "threat-scan" | "scan" => Self::ThreatScan,
            "transmit-quantum" => Self::Transmit {
                mode: UplinkMode::Quantum,
                attack: false,
            },
            "transmit-quantum-attack" => Self::Transmit {
                mode: UplinkMode::Quantum,
                attack: true,
            },
            "transmit-classical" => Self::Transmit {
                mode: UplinkMode::Classical,
                attack: false,
            },
            "transmit-classical-attack" => Self::Transmit {
                mode: UplinkMode::Classical,
                attack: true,
            },
            "export-snapshot" | "export" => Self::ExportSnapshot,
            _ => return Err(Error::UnknownAction(s.to_string())),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for name in Action::NAMES {
            let action: Action = name.parse().unwrap();
            assert_eq!(action.name(), name);
        }
    }

    #[test]
    fn aliases_and_case() {
        assert_eq!("GENERATE_QRNG".parse::<Action>().unwrap(), Action::GenerateQrng);
        assert_eq!("scan".parse::<Action>().unwrap(), Action::ThreatScan);
    }

    #[test]
    fn unknown_action_is_an_error() {
        let err = "launch".parse::<Action>().unwrap_err();
        assert!(matches!(err, Error::UnknownAction(ref s) if s == "launch"));
    }
}
