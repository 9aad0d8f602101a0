use serde::Serialize;

use crate::vehicle_client::helpers::{Brand, Region};

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub pin: &'a str,
    pub region: Region,
    pub brand: Brand,
}

#[derive(Serialize)]
pub struct StatusQuery {
    pub parsed: bool,
    pub refresh: bool,
}
