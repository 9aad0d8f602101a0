use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Credentials;
use crate::types::MonitorError;

use super::helpers::{Brand, Region};

/// Everything needed to open a vehicle-cloud session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub credentials: Credentials,
    pub region: Region,
    pub brand: Brand,
}

/// Vehicle as listed by the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub vin: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub generation: String,
}

impl VehicleInfo {
    /// `"<name> (<generation>)"`, the label the dashboard shows.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusRequest {
    /// Ask for the vendor's raw payload instead of the parsed summary.
    pub parsed: bool,
    /// Wake the car instead of serving cached backend data.
    pub refresh: bool,
}

#[async_trait]
pub trait VehicleConnector: Send + Sync {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn VehicleCloud>, MonitorError>;
}

#[async_trait]
pub trait VehicleCloud: Send + Sync {
    async fn list_vehicles(&self) -> Result<Vec<VehicleInfo>, MonitorError>;

    /// Fails with [`MonitorError::InvalidVehicleId`] when the VIN is unknown.
    async fn get_vehicle(&self, vin: &str) -> Result<Arc<dyn VehicleHandle>, MonitorError>;
}

#[async_trait]
pub trait VehicleHandle: Send + Sync {
    fn info(&self) -> &VehicleInfo;

    async fn status(&self, request: StatusRequest) -> Result<Value, MonitorError>;

    async fn location(&self) -> Result<Value, MonitorError>;
}
