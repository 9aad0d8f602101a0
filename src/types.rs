use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    Decode(String),

    #[error("region `{0}` is not supported, expected one of [US, EU, CA]")]
    UnsupportedRegion(String),

    #[error("brand `{0}` is not supported, expected one of [hyundai, kia]")]
    UnsupportedBrand(String),

    #[error("vehicle `{vin}` not found ({available} vehicles available)")]
    InvalidVehicleId { vin: String, available: usize },

    #[error("no vehicle available on this account")]
    NoVehicleAvailable,

    #[error("no VIN was provided and none could be located")]
    MissingVin,

    #[error("vehicle cloud returned {status_code}: {message}")]
    Transport { status_code: u16, message: String },

    #[error("fetch cycle timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Coarse, copyable classification of a [`MonitorError`] suitable for the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Connection,
    Decode,
    UnsupportedRegion,
    UnsupportedBrand,
    InvalidVehicleId,
    NoVehicleAvailable,
    MissingVin,
    Transport { status_code: u16 },
    Timeout,
    Internal,
}

/// Human-readable reading of a vehicle-cloud transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Unexpected,
}

impl TransportFailure {
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            400 => TransportFailure::BadRequest,
            401 => TransportFailure::Unauthorized,
            403 => TransportFailure::Forbidden,
            404 => TransportFailure::NotFound,
            _ => TransportFailure::Unexpected,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransportFailure::BadRequest => "bad request, likely invalid credentials",
            TransportFailure::Unauthorized => "unauthorized",
            TransportFailure::Forbidden => "forbidden",
            TransportFailure::NotFound => "not found",
            TransportFailure::Unexpected => "unexpected status",
        }
    }
}

impl MonitorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::Config(_) => ErrorKind::Config,
            MonitorError::Io(_) | MonitorError::Http(_) => ErrorKind::Connection,
            MonitorError::Decode(_) => ErrorKind::Decode,
            MonitorError::UnsupportedRegion(_) => ErrorKind::UnsupportedRegion,
            MonitorError::UnsupportedBrand(_) => ErrorKind::UnsupportedBrand,
            MonitorError::InvalidVehicleId { .. } => ErrorKind::InvalidVehicleId,
            MonitorError::NoVehicleAvailable => ErrorKind::NoVehicleAvailable,
            MonitorError::MissingVin => ErrorKind::MissingVin,
            MonitorError::Transport { status_code, .. } => ErrorKind::Transport {
                status_code: *status_code,
            },
            MonitorError::Timeout(_) => ErrorKind::Timeout,
            MonitorError::Task(_) => ErrorKind::Internal,
        }
    }

    /// Label used when logging a failed cycle.
    pub fn classification(&self) -> &'static str {
        match self {
            MonitorError::Transport { status_code, .. } => {
                TransportFailure::from_status(*status_code).label()
            }
            MonitorError::InvalidVehicleId { .. }
            | MonitorError::NoVehicleAvailable
            | MonitorError::MissingVin => "vehicle selection",
            MonitorError::UnsupportedRegion(_) | MonitorError::UnsupportedBrand(_) => {
                "unsupported account settings"
            }
            MonitorError::Timeout(_) => "timeout",
            MonitorError::Http(_) | MonitorError::Io(_) => "connection",
            MonitorError::Decode(_) => "decode",
            MonitorError::Config(_) => "configuration",
            MonitorError::Task(_) => "internal",
        }
    }
}
