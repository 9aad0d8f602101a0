use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::{MonitorConfig, MIN_REFRESH_INTERVAL};

impl MonitorConfig {
    pub fn charging_interval(&self) -> Duration {
        millis(self.refresh_interval_while_charging)
    }

    pub fn disconnected_interval(&self) -> Duration {
        millis(self.refresh_interval_while_disconnected)
    }

    pub fn under_battery_interval(&self) -> Option<Duration> {
        self.refresh_interval_while_under_battery_level.map(millis)
    }

    /// `None` when failed cycles should wait for an external refresh.
    pub fn failure_retry_interval(&self) -> Option<Duration> {
        match self.refresh_interval_after_failure {
            0 => None,
            ms => Some(millis(ms)),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        millis(self.fetch_timeout)
    }

    /// The configured VIN, ignoring blank values.
    pub fn configured_vin(&self) -> Option<&str> {
        self.vin
            .as_deref()
            .map(str::trim)
            .filter(|vin| !vin.is_empty())
    }
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms).max(MIN_REFRESH_INTERVAL)
}

const CONFIG_FILE: &str = "config.json";

/// Where config.json is looked up.
///
/// The dashboard installs its binary one directory below the install root, so
/// the root copy is preferred over one in the working directory.
pub(super) fn get_config_path() -> PathBuf {
    let install_root = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(|root| root.join(CONFIG_FILE)));
    let working_dir = PathBuf::from(CONFIG_FILE);

    let candidates: Vec<PathBuf> = install_root.into_iter().chain([working_dir]).collect();
    match first_existing(&candidates) {
        Some(path) => {
            debug!(path = %path.display(), "Using config file");
            path
        }
        None => candidates.into_iter().next().unwrap_or_else(|| PathBuf::from(CONFIG_FILE)),
    }
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}
