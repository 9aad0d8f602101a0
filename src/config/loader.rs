use std::env;
use std::path::Path;

use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::types::MonitorError;

use super::{paths, MonitorConfig};

impl MonitorConfig {
    /// Configuration from config.json, if one is installed.
    ///
    /// `None` when the file is missing or invalid; the first `CONFIG` from the
    /// UI then configures the poller instead.
    pub async fn load() -> Option<Self> {
        let config_path = paths::get_config_path();

        if !config_path.exists() {
            info!(
                path = %config_path.display(),
                "No config file, waiting for configuration from the UI"
            );
            return None;
        }

        match Self::load_from(&config_path).await {
            Ok(config) => {
                info!(
                    region = %config.region,
                    brand = %config.brand,
                    vin = ?config.vin,
                    "Loaded configuration"
                );
                Some(config.with_env_overrides())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    path = %config_path.display(),
                    "Ignoring config file, waiting for configuration from the UI"
                );
                None
            }
        }
    }

    /// Defaults with the environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Read and validate a config file at an explicit path.
    pub async fn load_from(path: &Path) -> Result<Self, MonitorError> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|err| MonitorError::Config(format!("Failed to read config file: {err}")))?;

        let value: Value = serde_json::from_str(&contents)
            .map_err(|err| MonitorError::Config(format!("Failed to parse config.json: {err}")))?;

        Self::from_value(value)
    }

    /// Deserialize a config payload, e.g. one received over the UI channel.
    pub fn from_value(value: Value) -> Result<Self, MonitorError> {
        let config: MonitorConfig = serde_json::from_value(value).map_err(|err| {
            MonitorError::Config(format!("Failed to deserialize config: {err}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.refresh_interval_while_charging == 0 {
            return Err(MonitorError::Config(
                "refreshIntervalWhileCharging must be greater than zero".to_string(),
            ));
        }
        if self.refresh_interval_while_disconnected == 0 {
            return Err(MonitorError::Config(
                "refreshIntervalWhileDisconnected must be greater than zero".to_string(),
            ));
        }
        if let Some(amount) = self.under_battery_level_amount {
            if amount > 100 {
                return Err(MonitorError::Config(format!(
                    "underBatteryLevelAmount must be a percentage, got {amount}"
                )));
            }
            if self.refresh_interval_while_under_battery_level.is_none() {
                return Err(MonitorError::Config(
                    "underBatteryLevelAmount requires refreshIntervalWhileUnderBatteryLevel"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("VEHICLE_BRIDGE_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                self.api_url = trimmed.to_string();
            }
        }
        if let Ok(password) = env::var("VEHICLE_CLOUD_PASSWORD") {
            if !password.trim().is_empty() {
                self.credentials.password = password;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::VehicleFallback;

    #[test]
    fn empty_payload_uses_defaults() {
        let config = MonitorConfig::from_value(json!({})).unwrap();
        assert_eq!(config.region, "US");
        assert_eq!(config.brand, "hyundai");
        assert!(config.show_last_updated);
        assert!(!config.wake_on_refresh);
        assert_eq!(config.charging_interval(), Duration::from_secs(600));
        assert_eq!(config.disconnected_interval(), Duration::from_secs(3600));
        assert_eq!(config.vehicle_fallback, VehicleFallback::SingleVehicle);
    }

    #[test]
    fn camel_case_fields_are_read() {
        let config = MonitorConfig::from_value(json!({
            "username": "driver@example.com",
            "password": "secret",
            "pin": "1234",
            "region": "EU",
            "vin": "KMH123",
            "wakeOnModuleLoad": true,
            "refreshIntervalWhileCharging": 500,
            "refreshIntervalWhileUnderBatteryLevel": 120000,
            "underBatteryLevelAmount": 40,
            "vehicleFallback": "firstVehicle"
        }))
        .unwrap();
        assert_eq!(config.credentials.username, "driver@example.com");
        assert_eq!(config.region, "EU");
        assert_eq!(config.vin.as_deref(), Some("KMH123"));
        assert!(config.wake_on_module_load);
        assert_eq!(config.under_battery_level_amount, Some(40));
        assert_eq!(config.vehicle_fallback, VehicleFallback::FirstVehicle);
        // floored to one second
        assert_eq!(config.charging_interval(), Duration::from_secs(1));
    }

    #[test]
    fn threshold_without_interval_is_rejected() {
        let err = MonitorConfig::from_value(json!({ "underBatteryLevelAmount": 30 })).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn zero_disconnected_interval_is_rejected() {
        let err =
            MonitorConfig::from_value(json!({ "refreshIntervalWhileDisconnected": 0 })).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = MonitorConfig::from_value(json!({
            "username": "driver",
            "password": "hunter2",
            "pin": "9876"
        }))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("driver"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("9876"));
    }

    #[tokio::test]
    async fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{ "region": "CA", "showLastUpdated": false }"#)
            .await
            .unwrap();

        let config = MonitorConfig::load_from(&path).await.unwrap();
        assert_eq!(config.region, "CA");
        assert!(!config.show_last_updated);
    }

    #[tokio::test]
    async fn load_from_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = MonitorConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }
}
