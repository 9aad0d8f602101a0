use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Refresh intervals are never allowed to drop below this.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the vehicle dashboard, as sent by the UI or read from config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(flatten)]
    pub credentials: Credentials,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_brand")]
    pub brand: String,

    #[serde(default)]
    pub vin: Option<String>,

    /// Title shown instead of the vehicle's own name.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub wake_on_module_load: bool,

    #[serde(default)]
    pub wake_on_refresh: bool,

    #[serde(default = "default_true")]
    pub show_last_updated: bool,

    #[serde(default = "default_charging_interval")]
    pub refresh_interval_while_charging: u64,

    #[serde(default = "default_disconnected_interval")]
    pub refresh_interval_while_disconnected: u64,

    #[serde(default)]
    pub refresh_interval_while_under_battery_level: Option<u64>,

    #[serde(default)]
    pub under_battery_level_amount: Option<u8>,

    #[serde(default)]
    pub vehicle_fallback: VehicleFallback,

    /// Delay before retrying after a failed cycle; `0` waits for an external refresh instead.
    #[serde(default = "default_failure_interval")]
    pub refresh_interval_after_failure: u64,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

/// Account credentials for the vehicle cloud.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub pin: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("pin", &"<redacted>")
            .finish()
    }
}

/// What to do when the VIN cannot be found on the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VehicleFallback {
    /// Only fall back when the account holds exactly one vehicle.
    #[default]
    SingleVehicle,
    /// Fall back to the first listed vehicle.
    FirstVehicle,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            region: default_region(),
            brand: default_brand(),
            vin: None,
            name: None,
            wake_on_module_load: false,
            wake_on_refresh: false,
            show_last_updated: true,
            refresh_interval_while_charging: default_charging_interval(),
            refresh_interval_while_disconnected: default_disconnected_interval(),
            refresh_interval_while_under_battery_level: None,
            under_battery_level_amount: None,
            vehicle_fallback: VehicleFallback::default(),
            refresh_interval_after_failure: default_failure_interval(),
            fetch_timeout: default_fetch_timeout(),
            api_url: default_api_url(),
        }
    }
}

fn default_region() -> String {
    "US".to_string()
}

fn default_brand() -> String {
    "hyundai".to_string()
}

fn default_true() -> bool {
    true
}

fn default_charging_interval() -> u64 {
    10 * 60 * 1000
}

fn default_disconnected_interval() -> u64 {
    60 * 60 * 1000
}

fn default_failure_interval() -> u64 {
    5 * 60 * 1000
}

fn default_fetch_timeout() -> u64 {
    2 * 60 * 1000
}

fn default_api_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
