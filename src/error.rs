//! Race setup error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaceError {
    /// Setup values that can never produce a runnable race
    #[error("Invalid race config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse race config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Failed to read race config: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Snapshot or event serialization for the host
    #[error("Failed to export race data: {0}")]
    Export(#[source] serde_json::Error),
}

impl RaceError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RaceError::InvalidConfig(msg.into())
    }
}
