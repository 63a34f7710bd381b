//! Fixed 4-byte wire encoding of a temperature/pressure pair.
//!
//! Binary format (little-endian):
//! - bytes 0..2: temperature in centi-degrees Celsius, signed 16-bit
//! - bytes 2..4: pressure in centi-hectopascal, signed 16-bit
//!
//! Values are scaled by 100 and truncated toward zero, giving 0.01-unit
//! resolution over ±327.67. Anything outside that range wraps at the 16-bit
//! boundary; deployed receivers decode the wrapped value, so the wrap is
//! part of the wire contract and must not be replaced with saturation.

use crate::measurement::Measurement;

/// Number of bytes in one encoded reading.
pub const PAYLOAD_LEN: usize = 4;

/// One encoded reading, ready for the notify characteristic.
pub type Payload = [u8; PAYLOAD_LEN];

/// Fixed-point scale factor (0.01-unit resolution).
const SCALE: f32 = 100.0;

/// Scale a value onto the 16-bit wire grid.
///
/// The f32 -> i32 cast truncates toward zero (NaN becomes 0); the i32 -> i16
/// cast keeps the low 16 bits, which is the two's-complement wrap the format
/// requires. A direct `as i16` cast would saturate instead.
fn scale_to_wire(value: f32) -> i16 {
    ((value * SCALE) as i32) as i16
}

/// Pack a temperature (degrees C) and pressure (hPa) into a payload.
pub fn encode(temperature_c: f32, pressure_hpa: f32) -> Payload {
    let t = scale_to_wire(temperature_c);
    let p = scale_to_wire(pressure_hpa);

    let mut payload = [0u8; PAYLOAD_LEN];
    payload[0..2].copy_from_slice(&t.to_le_bytes());
    payload[2..4].copy_from_slice(&p.to_le_bytes());
    payload
}

/// Recover a measurement from a payload, at the format's 0.01 resolution.
pub fn decode(payload: &Payload) -> Measurement {
    let t = i16::from_le_bytes([payload[0], payload[1]]);
    let p = i16::from_le_bytes([payload[2], payload[3]]);
    Measurement::new(t as f32 / SCALE, p as f32 / SCALE)
}
