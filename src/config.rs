mod loader;
mod paths;
mod types;

pub use types::{Credentials, MonitorConfig, VehicleFallback, MIN_REFRESH_INTERVAL};
