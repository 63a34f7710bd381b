//! Desktop simulator for the envcast sensor-to-BLE bridge.
//!
//! Runs the real control loop against synthetic collaborators: a sinusoidal
//! sensor, a transmitter that logs each payload next to its decoded reading,
//! and a panel that logs draw calls instead of pushing pixels.
//!
//! ```text
//! RUST_LOG=info cargo run
//! RUST_LOG=info cargo run -- --degraded   # simulate a failed sensor init
//! ```

use std::convert::Infallible;
use std::time::Duration;

use embedded_hal_async::delay::DelayNs;
use log::info;

use envcast_core::bridge::{CYCLE_INTERVAL_MS, SensorBridge};
use envcast_core::codec::{self, Payload};
use envcast_core::panel::{PanelTone, TextPanel};
use envcast_core::sensors::EnvSensor;
use envcast_core::transmit::Transmitter;

/// Synthetic BMP280: slow sine waves around room conditions.
///
/// When constructed degraded it behaves like the real part after a failed
/// probe: still answering, just with meaningless values.
struct SyntheticSensor {
    elapsed_secs: f64,
    init_ok: bool,
    temperature_c: f32,
    pressure_pa: f32,
}

impl SyntheticSensor {
    fn new(init_ok: bool) -> Self {
        Self {
            elapsed_secs: 0.0,
            init_ok,
            temperature_c: 0.0,
            pressure_pa: 0.0,
        }
    }

    /// Advance the internal clock by one cycle and refresh both values.
    fn advance(&mut self) {
        self.elapsed_secs += CYCLE_INTERVAL_MS as f64 / 1000.0;
        if !self.init_ok {
            // Blank-calibration junk, like the real part in degraded mode.
            return;
        }
        let t = self.elapsed_secs;

        // Temperature: 20-26 degC sinusoidal with slow drift
        self.temperature_c = (23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos()) as f32;

        // Pressure: around one atmosphere, in Pascal
        self.pressure_pa = (101_325.0 + 400.0 * (t / 300.0).sin() + 60.0 * (t / 41.0).cos()) as f32;
    }
}

impl EnvSensor for SyntheticSensor {
    async fn init(&mut self) -> bool {
        self.init_ok
    }

    async fn read_temperature(&mut self) -> f32 {
        self.advance();
        self.temperature_c
    }

    async fn read_pressure_raw(&mut self) -> f32 {
        self.pressure_pa
    }
}

/// Transmitter that narrates instead of radiating.
struct LogTransmitter;

impl Transmitter for LogTransmitter {
    async fn publish(&mut self, payload: Payload) {
        let reading = codec::decode(&payload);
        info!(
            "notify {:02x?}  ({:.2} C, {:.2} hPa)",
            payload, reading.temperature_c, reading.pressure_hpa
        );
    }
}

/// Panel that logs draw calls.
struct LogPanel;

impl TextPanel for LogPanel {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Infallible> {
        info!("panel cleared");
        Ok(())
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        tone: PanelTone,
        text: &str,
    ) -> Result<(), Infallible> {
        info!("panel ({x:3},{y:3}) {tone:?}: {text}");
        Ok(())
    }
}

/// Cycle delay over the tokio timer.
struct TokioDelay;

impl DelayNs for TokioDelay {
    async fn delay_ns(&mut self, ns: u32) {
        tokio::time::sleep(Duration::from_nanos(ns as u64)).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let degraded = std::env::args().any(|arg| arg == "--degraded");
    info!(
        "Starting envcast simulator{}",
        if degraded { " (degraded sensor)" } else { "" }
    );

    let mut bridge = SensorBridge::new(
        SyntheticSensor::new(!degraded),
        LogTransmitter,
        LogPanel,
        TokioDelay,
    );

    bridge.start().await;
    bridge.run().await
}
