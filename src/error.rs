//! Error types for the Pantabox bridge
//! Every fallible operation in the crate funnels into [`BridgeError`].

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced to the caller of a bridge operation.
///
/// None of these are fatal to the process; a failed call leaves the
/// device directory untouched so a later call can simply retry.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Device {0} not found within the scan window")]
    NotFound(String),
    #[error("Connecting to {address} failed: {reason}")]
    ConnectFailed { address: String, reason: String },
    #[error("Attribute discovery on {address} failed after {attempts} attempts")]
    DiscoveryFailed { address: String, attempts: u32 },
    #[error("Characteristic {uuid} unavailable: {reason}")]
    CharacteristicUnavailable { uuid: Uuid, reason: String },
    #[error("Malformed {record} record: expected {expected} bytes, got {actual}")]
    MalformedRecord {
        record: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid current value {value} A (allowed {min}..={max})")]
    InvalidCurrent { value: i64, min: u8, max: u8 },
    #[error("Settings write rejected: {0}")]
    WriteRejected(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Bluetooth adapter error: {0}")]
    Adapter(String),
    #[error("Bluetooth transport error: {0}")]
    Transport(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// HTTP-style status the request layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCurrent { .. } | Self::InvalidCommand(_) => 400,
            Self::NotFound(_) => 404,
            Self::Cancelled => 499,
            Self::MalformedRecord { .. } => 502,
            _ => 500,
        }
    }
}

impl From<bluest::Error> for BridgeError {
    fn from(err: bluest::Error) -> Self {
        BridgeError::Transport(err.to_string())
    }
}
