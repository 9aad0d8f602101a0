mod api;
mod client;
mod cloud;
mod helpers;
mod models;

pub use client::RestConnector;
pub use cloud::{
    ConnectOptions, StatusRequest, VehicleCloud, VehicleConnector, VehicleHandle, VehicleInfo,
};
pub use helpers::{Brand, Region};
pub use models::{DistanceUnit, Location, VehicleSnapshot};
