//! Render-ready projection of the latest vehicle snapshot.

mod ticker;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::vehicle_client::VehicleSnapshot;

pub use ticker::{Presenter, PresenterOptions, TICK_INTERVAL};

pub const SLEEP_BADGE: &str = "Sleeping";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DisplayState {
    /// Nothing has been received yet.
    Loading,
    /// A snapshot arrived but carried no battery level.
    NoData,
    Ready(VehicleView),
}

impl DisplayState {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DisplayState::Loading => Some("Loading..."),
            DisplayState::NoData => Some("No correct data found"),
            DisplayState::Ready(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleView {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_badge: Option<&'static str>,
    pub charge_label: String,
    pub range_label: String,
    pub battery_percent: u8,
    pub battery_band: BatteryBand,
    pub lock_icon: LockIcon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_ago: Option<String>,
}

impl VehicleView {
    /// `"<charge label> - <range>"`, the line under the title.
    pub fn summary(&self) -> String {
        format!("{} - {}", self.charge_label, self.range_label)
    }
}

/// Battery fill colour. Boundary values resolve to the higher band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryBand {
    Red,
    Orange,
    Yellow,
    Green,
}

impl BatteryBand {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            75..=u8::MAX => BatteryBand::Green,
            50..=74 => BatteryBand::Yellow,
            25..=49 => BatteryBand::Orange,
            _ => BatteryBand::Red,
        }
    }

    pub fn fill_style(self) -> &'static str {
        match self {
            BatteryBand::Green => "fill:rgba(45,220,45,0.7)",
            BatteryBand::Yellow => "fill:rgba(220,220,45,0.7)",
            BatteryBand::Orange => "fill:rgba(220,120,45,0.7)",
            BatteryBand::Red => "fill:rgba(220,45,45,0.7)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockIcon {
    Locked,
    Unlocked,
}

impl LockIcon {
    pub fn from_locked(locked: bool) -> Self {
        if locked {
            LockIcon::Locked
        } else {
            LockIcon::Unlocked
        }
    }
}

/// Project a snapshot onto display fields as of `now`.
pub fn project(snapshot: Option<&VehicleSnapshot>, now: DateTime<Utc>) -> DisplayState {
    let Some(snapshot) = snapshot else {
        return DisplayState::Loading;
    };
    let Some(battery_percent) = snapshot.battery_percent else {
        return DisplayState::NoData;
    };

    DisplayState::Ready(VehicleView {
        title: snapshot.name.clone(),
        sleep_badge: snapshot.sleep_mode.unwrap_or(false).then_some(SLEEP_BADGE),
        charge_label: charge_label(snapshot.charging, snapshot.charge_remaining_minutes),
        range_label: range_label(snapshot),
        battery_percent,
        battery_band: BatteryBand::from_percent(battery_percent),
        lock_icon: LockIcon::from_locked(snapshot.locked),
        update_ago: Some(update_ago(snapshot.fetched_at, now)),
    })
}

pub fn charge_label(charging: bool, remaining_minutes: Option<u32>) -> String {
    match (charging, remaining_minutes) {
        (true, Some(minutes)) => format!("Charging ({}h to go)", minutes / 60),
        (true, None) => "Charging".to_string(),
        (false, _) => "Disconnected".to_string(),
    }
}

fn range_label(snapshot: &VehicleSnapshot) -> String {
    let range = snapshot.range.unwrap_or(0.0).max(0.0).floor();
    format!("{} {}", range as u64, snapshot.range_unit.abbreviation())
}

pub fn update_ago(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(fetched_at).num_seconds().max(0);
    if elapsed < 60 {
        return "Updated less than a minute ago".to_string();
    }
    match elapsed / 60 {
        1 => "Updated 1 minute ago".to_string(),
        minutes => format!("Updated {minutes} minutes ago"),
    }
}
