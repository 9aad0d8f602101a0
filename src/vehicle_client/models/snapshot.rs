use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{DistanceUnit, Location};
use crate::vehicle_client::VehicleInfo;

/// Normalized result of one successful fetch cycle.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub name: String,
    pub vin: String,
    pub charging: bool,
    /// Battery percentage, clamped to 0..=100. `None` when the backend did not report one.
    pub battery_percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
    pub range_unit: DistanceUnit,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_remaining_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_mode: Option<bool>,
    pub fetched_at: DateTime<Utc>,
}

impl VehicleSnapshot {
    /// Merge the unparsed status and location payloads into a snapshot.
    pub fn from_parts(
        info: &VehicleInfo,
        status: &Value,
        location: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let ev_status = status.get("evStatus");
        let ev_range = ev_status
            .and_then(|ev| ev.get("drvDistance"))
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("rangeByFuel"))
            .and_then(|v| v.get("evModeRange"));

        Self {
            name: info.display_name(),
            vin: info.vin.clone(),
            charging: ev_status
                .and_then(|ev| ev.get("batteryCharge"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            battery_percent: ev_status
                .and_then(|ev| ev.get("batteryStatus"))
                .and_then(|v| v.as_f64())
                .map(|pct| pct.clamp(0.0, 100.0).round() as u8),
            range: ev_range.and_then(|r| r.get("value")).and_then(|v| v.as_f64()),
            range_unit: DistanceUnit::from_code(
                ev_range.and_then(|r| r.get("unit")).and_then(|v| v.as_u64()),
            ),
            locked: status
                .get("doorLock")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            charge_remaining_minutes: ev_status
                .and_then(|ev| ev.get("remainTime2"))
                .and_then(|v| v.get("atc"))
                .and_then(|v| v.get("value"))
                .and_then(|v| v.as_f64())
                .filter(|minutes| minutes.is_finite() && *minutes >= 0.0)
                .map(|minutes| minutes.floor().min(u32::MAX as f64) as u32),
            location: Location::from_value(location),
            sleep_mode: status.get("sleepModeCheck").and_then(|v| v.as_bool()),
            fetched_at,
        }
    }
}
