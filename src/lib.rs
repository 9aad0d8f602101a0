pub mod bridge;
pub mod config;
pub mod poller;
pub mod presentation;
pub mod protocol;
pub mod types;
pub mod vehicle_client;
