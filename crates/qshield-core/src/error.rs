//! Error types.
//!
//! Only loading configuration or seed data and writing exports can fail. Ticks,
//! view activation, actions and teardown degrade to "skip this update" instead
//! of returning errors.

use std::path::PathBuf;

/// Errors surfaced by the dashboard library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown view '{0}' (expected overview, qkd, qrng, threats or analytics)")]
    UnknownView(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Library result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A named display container or chart target does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("display surface '{0}' is missing")]
    Missing(String),
}
