//! Messages exchanged with the UI layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ErrorKind, MonitorError};
use crate::vehicle_client::VehicleSnapshot;

/// One-way notifications pushed from the poller.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "notification",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Notification {
    Started(bool),
    /// Latest snapshot, or `None` when nothing has been fetched yet.
    CarData(Option<Arc<VehicleSnapshot>>),
    FetchError(FetchFailure),
}

/// Coarse error state forwarded to the UI after a failed cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchFailure {
    #[serde(flatten)]
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&MonitorError> for FetchFailure {
    fn from(err: &MonitorError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Control messages accepted from the UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "notification", content = "payload")]
pub enum UiRequest {
    #[serde(rename = "CONFIG", alias = "BLUELINKY2_CONFIG")]
    Config(Value),
    #[serde(rename = "REFRESH")]
    Refresh,
}
