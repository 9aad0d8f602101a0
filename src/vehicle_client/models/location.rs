use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Reads `latitude`/`longitude` (or `lat`/`lng`), optionally nested under `coord`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let source = value.get("coord").unwrap_or(value);
        let latitude = source
            .get("latitude")
            .or_else(|| source.get("lat"))
            .and_then(|v| v.as_f64())?;
        let longitude = source
            .get("longitude")
            .or_else(|| source.get("lng"))
            .or_else(|| source.get("lon"))
            .and_then(|v| v.as_f64())?;
        Some(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Miles,
}

impl DistanceUnit {
    /// Vendor unit codes: 1 is kilometres, 3 is miles.
    pub fn from_code(code: Option<u64>) -> Self {
        match code {
            Some(3) => DistanceUnit::Miles,
            _ => DistanceUnit::Kilometers,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}
