use std::future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep, Sleep};

use crate::config::MonitorConfig;
use crate::vehicle_client::VehicleSnapshot;

/// Which rule picked the next refresh delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayRule {
    Charging,
    UnderBatteryLevel,
    Disconnected,
}

impl DelayRule {
    pub fn describe(self) -> &'static str {
        match self {
            DelayRule::Charging => "battery is charging",
            DelayRule::UnderBatteryLevel => "battery is under the configured level",
            DelayRule::Disconnected => "battery is not charging",
        }
    }
}

/// First matching rule wins: charging, then under-battery-level, then disconnected.
pub fn select_delay(config: &MonitorConfig, snapshot: &VehicleSnapshot) -> (Duration, DelayRule) {
    if snapshot.charging {
        return (config.charging_interval(), DelayRule::Charging);
    }

    if let (Some(threshold), Some(interval), Some(battery)) = (
        config.under_battery_level_amount,
        config.under_battery_interval(),
        snapshot.battery_percent,
    ) {
        if battery <= threshold {
            return (interval, DelayRule::UnderBatteryLevel);
        }
    }

    (config.disconnected_interval(), DelayRule::Disconnected)
}

/// Holds at most one pending refresh. Arming replaces whatever was pending.
#[derive(Default)]
pub struct RefreshSchedule {
    pending: Option<(Pin<Box<Sleep>>, Duration)>,
}

impl RefreshSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, delay: Duration) {
        self.pending = Some((Box::pin(sleep(delay)), delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Delay of the pending refresh, if one is armed.
    pub fn pending_delay(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(_, delay)| *delay)
    }

    /// Resolves when the pending refresh is due. Never resolves while nothing is armed.
    pub async fn fired(&mut self) {
        match self.pending.as_mut() {
            Some((sleep, _)) => {
                sleep.as_mut().await;
                self.pending = None;
            }
            None => future::pending::<()>().await,
        }
    }
}
