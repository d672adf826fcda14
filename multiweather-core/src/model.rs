use serde::Serialize;
use std::time::Duration;

/// Temperature in degrees Kelvin. Every provider normalizes to this unit.
pub type Kelvin = f64;

pub const KELVIN_OFFSET: f64 = 273.15;

pub fn celsius_to_kelvin(celsius: f64) -> Kelvin {
    celsius + KELVIN_OFFSET
}

/// Aggregated answer for one city, as rendered to HTTP callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReport {
    pub city: String,
    pub temp: Kelvin,
    #[serde(rename = "timeTook")]
    pub time_took: String,
}

impl TemperatureReport {
    pub fn new(city: impl Into<String>, temp: Kelvin, elapsed: Duration) -> Self {
        Self {
            city: city.into(),
            temp,
            time_took: format!("{elapsed:?}"),
        }
    }
}
