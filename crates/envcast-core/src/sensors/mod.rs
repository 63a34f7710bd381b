//! Sensor port and the BMP280 implementation behind it.

mod bmp280;

pub use bmp280::{ADDRESS, ADDRESS_ALT, Bmp280, Bmp280Error};

/// Port for the environmental sensor feeding the bridge.
///
/// This trait abstracts the hardware sensor so the control loop can run
/// against the real BMP280, the simulator's synthetic source, or a scripted
/// fake in tests.
///
/// Reads are infallible by contract: after a failed `init` the sensor must
/// still answer (with whatever values it has), never panic or block the
/// loop. Surfacing the failure is the bridge's job, via the panel warning.
pub trait EnvSensor {
    /// One-shot hardware bring-up. Returns `false` when the sensor did not
    /// respond; the device then runs in degraded mode.
    fn init(&mut self) -> impl Future<Output = bool>;

    /// Ambient temperature in degrees Celsius.
    fn read_temperature(&mut self) -> impl Future<Output = f32>;

    /// Pressure in Pascal. Callers divide by 100 for hPa.
    fn read_pressure_raw(&mut self) -> impl Future<Output = f32>;
}
