use std::sync::Arc;

use chrono::Utc;
use tokio::time::timeout;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::types::MonitorError;
use crate::vehicle_client::{ConnectOptions, StatusRequest, VehicleConnector, VehicleSnapshot};

use super::resolve::resolve_vehicle;

/// Inputs of one fetch cycle, captured when the cycle is dispatched.
#[derive(Debug, Clone)]
pub struct CycleRequest {
    pub config: Arc<MonitorConfig>,
    /// Previously resolved VIN, else the configured one.
    pub vin: Option<String>,
    /// Force the backend to query the physical vehicle.
    pub wake: bool,
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// VIN actually used, which may differ from the requested one after fallback.
    pub vin: String,
    pub snapshot: VehicleSnapshot,
}

/// Runs a cycle bounded by the configured fetch timeout.
pub(crate) async fn run_bounded(
    connector: Arc<dyn VehicleConnector>,
    request: CycleRequest,
) -> Result<CycleOutcome, MonitorError> {
    let limit = request.config.fetch_timeout();
    match timeout(limit, run_fetch_cycle(connector.as_ref(), &request)).await {
        Ok(result) => result,
        Err(_) => Err(MonitorError::Timeout(limit)),
    }
}

/// Connect, resolve the vehicle, fetch status and location, and normalize them.
pub async fn run_fetch_cycle(
    connector: &dyn VehicleConnector,
    request: &CycleRequest,
) -> Result<CycleOutcome, MonitorError> {
    let config = &request.config;
    let options = ConnectOptions {
        credentials: config.credentials.clone(),
        region: config.region.parse()?,
        brand: config.brand.parse()?,
    };

    let cloud = connector.connect(&options).await?;
    let vehicle = resolve_vehicle(
        cloud.as_ref(),
        request.vin.as_deref(),
        config.vehicle_fallback,
    )
    .await?;

    let status_request = StatusRequest {
        parsed: false,
        refresh: request.wake,
    };
    debug!(vin = %vehicle.info().vin, wake = request.wake, "Requesting vehicle status");

    let (status, location) = tokio::try_join!(vehicle.status(status_request), vehicle.location())?;
    let snapshot = VehicleSnapshot::from_parts(vehicle.info(), &status, &location, Utc::now());

    Ok(CycleOutcome {
        vin: vehicle.info().vin.clone(),
        snapshot,
    })
}
