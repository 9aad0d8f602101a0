use std::sync::Arc;

use tracing::{info, warn};

use crate::config::VehicleFallback;
use crate::types::MonitorError;
use crate::vehicle_client::{VehicleCloud, VehicleHandle, VehicleInfo};

/// Find the vehicle to query.
///
/// Without a VIN the first vehicle on the account is used. An unknown VIN falls
/// back according to `fallback`; a single-vehicle account always falls back.
pub async fn resolve_vehicle(
    cloud: &dyn VehicleCloud,
    candidate: Option<&str>,
    fallback: VehicleFallback,
) -> Result<Arc<dyn VehicleHandle>, MonitorError> {
    let mut listed: Option<Vec<VehicleInfo>> = None;

    let vin = match candidate.map(str::trim).filter(|vin| !vin.is_empty()) {
        Some(vin) => vin.to_string(),
        None => {
            let vehicles = cloud.list_vehicles().await?;
            let first = vehicles.first().ok_or(MonitorError::NoVehicleAvailable)?;
            let vin = usable_vin(first)?;
            info!(vin = %vin, "No VIN configured, using the first vehicle on the account");
            listed = Some(vehicles);
            vin
        }
    };

    match cloud.get_vehicle(&vin).await {
        Ok(vehicle) => Ok(vehicle),
        Err(MonitorError::InvalidVehicleId { .. }) => {
            warn!(vin = %vin, "Unable to get the vehicle with the configured VIN");
            let vehicles = match listed {
                Some(vehicles) => vehicles,
                None => cloud.list_vehicles().await?,
            };
            let replacement = pick_replacement(&vin, &vehicles, fallback)?;
            cloud.get_vehicle(&replacement).await
        }
        Err(err) => Err(err),
    }
}

fn pick_replacement(
    vin: &str,
    vehicles: &[VehicleInfo],
    fallback: VehicleFallback,
) -> Result<String, MonitorError> {
    let first = vehicles.first().ok_or(MonitorError::NoVehicleAvailable)?;

    match (vehicles.len(), fallback) {
        (1, _) => {
            warn!(
                vin = %vin,
                replacement = %first.vin,
                "VIN is invalid, but the account holds a single vehicle; using that one instead"
            );
        }
        (available, VehicleFallback::FirstVehicle) => {
            warn!(
                vin = %vin,
                replacement = %first.vin,
                available,
                "VIN is invalid, choosing the first vehicle on the account"
            );
        }
        (available, VehicleFallback::SingleVehicle) => {
            return Err(MonitorError::InvalidVehicleId {
                vin: vin.to_string(),
                available,
            });
        }
    }

    usable_vin(first)
}

fn usable_vin(vehicle: &VehicleInfo) -> Result<String, MonitorError> {
    let vin = vehicle.vin.trim();
    if vin.is_empty() {
        return Err(MonitorError::MissingVin);
    }
    Ok(vin.to_string())
}
