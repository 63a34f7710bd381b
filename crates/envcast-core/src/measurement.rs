//! Measurement domain type.
//!
//! A `Measurement` lives for exactly one loop cycle: read from the sensor,
//! projected into a payload, rendered, then dropped.

use serde::{Deserialize, Serialize};

/// A single temperature/pressure sample.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature_c: f32,
    /// Hectopascal.
    pub pressure_hpa: f32,
}

impl Measurement {
    pub const fn new(temperature_c: f32, pressure_hpa: f32) -> Self {
        Self {
            temperature_c,
            pressure_hpa,
        }
    }
}
