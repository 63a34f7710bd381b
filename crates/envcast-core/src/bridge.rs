//! The sampling-encode-transmit control loop.
//!
//! One cycle: read the sensor, encode the reading into the 4-byte payload,
//! hand it to the transmitter, mirror the values on the panel, then pause
//! for the fixed interval. The loop owns all of its collaborators; nothing
//! is shared across cycles and nothing ever aborts it.

use core::fmt::Write as _;

use embedded_hal_async::delay::DelayNs;
use heapless::String;
use log::{debug, warn};

use crate::codec;
use crate::measurement::Measurement;
use crate::panel::{PanelTone, TextPanel, layout};
use crate::sensors::EnvSensor;
use crate::transmit::Transmitter;

/// Fixed end-of-cycle pause (~30 Hz). Not runtime-configurable.
pub const CYCLE_INTERVAL_MS: u32 = 33;

const TITLE: &str = "BMP280";
const TEMPERATURE_LABEL: &str = "temperature:";
const PRESSURE_LABEL: &str = "pressure:";
const SENSOR_WARNING: &str = "Failed BMP280 init.";

/// Composition root of the pipeline: owns the sensor, the radio, the panel
/// and the cycle delay, constructed once at startup and driven strictly
/// sequentially.
pub struct SensorBridge<S, T, P, D> {
    sensor: S,
    transmitter: T,
    panel: P,
    delay: D,
    degraded: bool,
}

impl<S, T, P, D> SensorBridge<S, T, P, D>
where
    S: EnvSensor,
    T: Transmitter,
    P: TextPanel,
    D: DelayNs,
{
    pub fn new(sensor: S, transmitter: T, panel: P, delay: D) -> Self {
        Self {
            sensor,
            transmitter,
            panel,
            delay,
            degraded: false,
        }
    }

    /// Whether sensor bring-up failed and the readings are suspect.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// One-shot bring-up: sensor init plus the static panel chrome.
    ///
    /// A failed init drops the bridge into degraded mode: the warning line
    /// goes on the panel and the loop runs anyway, broadcasting whatever
    /// the sensor answers.
    pub async fn start(&mut self) {
        self.degraded = !self.sensor.init().await;

        if let Err(e) = self.panel.clear() {
            debug!("panel clear failed: {:?}", e);
        }
        self.draw(layout::TITLE, PanelTone::Normal, TITLE);
        self.draw(layout::TEMPERATURE_LABEL, PanelTone::Normal, TEMPERATURE_LABEL);
        self.draw(layout::PRESSURE_LABEL, PanelTone::Normal, PRESSURE_LABEL);

        if self.degraded {
            warn!("sensor init failed; readings are invalid until power cycle");
            self.draw(layout::SENSOR_WARNING, PanelTone::Alert, SENSOR_WARNING);
        }
    }

    /// Unbounded production loop. Exits only with power.
    pub async fn run(&mut self) -> ! {
        loop {
            self.run_cycle().await;
            self.delay.delay_ms(CYCLE_INTERVAL_MS).await;
        }
    }

    /// Bounded variant of [`Self::run`] so the per-cycle logic can be
    /// driven under test or from the simulator.
    pub async fn run_cycles(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.run_cycle().await;
            self.delay.delay_ms(CYCLE_INTERVAL_MS).await;
        }
    }

    /// One tick: read, encode, publish, render.
    async fn run_cycle(&mut self) {
        let temperature_c = self.sensor.read_temperature().await;
        // The sensor reports Pascal; the wire format and the panel use hPa.
        let pressure_hpa = self.sensor.read_pressure_raw().await / 100.0;
        let reading = Measurement::new(temperature_c, pressure_hpa);

        let payload = codec::encode(reading.temperature_c, reading.pressure_hpa);
        self.transmitter.publish(payload).await;

        self.render(&reading);
    }

    fn render(&mut self, reading: &Measurement) {
        let mut text: String<32> = String::new();
        let _ = write!(text, "{:.2}C", reading.temperature_c);
        self.draw(layout::TEMPERATURE_VALUE, PanelTone::Normal, &text);

        text.clear();
        let _ = write!(text, "{:.2}hPa", reading.pressure_hpa);
        self.draw(layout::PRESSURE_VALUE, PanelTone::Normal, &text);
    }

    fn draw(&mut self, at: (i32, i32), tone: PanelTone, text: &str) {
        if let Err(e) = self.panel.draw_text(at.0, at.1, tone, text) {
            debug!("panel write failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::cell::RefCell;
    use std::rc::Rc;
    use std::string::String as StdString;
    use std::vec::Vec;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        ReadTemperature,
        ReadPressure,
        Publish(codec::Payload),
        Draw {
            at: (i32, i32),
            tone: PanelTone,
            text: StdString,
        },
        Sleep(u32),
    }

    type Trace = Rc<RefCell<Vec<Event>>>;

    struct FakeSensor {
        trace: Trace,
        init_ok: bool,
        temperature_c: f32,
        pressure_pa: f32,
    }

    impl EnvSensor for FakeSensor {
        async fn init(&mut self) -> bool {
            self.init_ok
        }

        async fn read_temperature(&mut self) -> f32 {
            self.trace.borrow_mut().push(Event::ReadTemperature);
            self.temperature_c
        }

        async fn read_pressure_raw(&mut self) -> f32 {
            self.trace.borrow_mut().push(Event::ReadPressure);
            self.pressure_pa
        }
    }

    struct FakeTransmitter {
        trace: Trace,
    }

    impl Transmitter for FakeTransmitter {
        async fn publish(&mut self, payload: codec::Payload) {
            self.trace.borrow_mut().push(Event::Publish(payload));
        }
    }

    struct FakePanel {
        trace: Trace,
        fail: bool,
    }

    impl TextPanel for FakePanel {
        type Error = &'static str;

        fn clear(&mut self) -> Result<(), Self::Error> {
            if self.fail { Err("clear rejected") } else { Ok(()) }
        }

        fn draw_text(
            &mut self,
            x: i32,
            y: i32,
            tone: PanelTone,
            text: &str,
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err("draw rejected");
            }
            self.trace.borrow_mut().push(Event::Draw {
                at: (x, y),
                tone,
                text: StdString::from(text),
            });
            Ok(())
        }
    }

    /// Virtual clock: records the requested pause instead of sleeping.
    struct FakeDelay {
        trace: Trace,
    }

    impl DelayNs for FakeDelay {
        async fn delay_ns(&mut self, _ns: u32) {
            unreachable!("the bridge paces in whole milliseconds");
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.trace.borrow_mut().push(Event::Sleep(ms));
        }
    }

    fn bridge(
        init_ok: bool,
        panel_fail: bool,
        temperature_c: f32,
        pressure_pa: f32,
    ) -> (
        SensorBridge<FakeSensor, FakeTransmitter, FakePanel, FakeDelay>,
        Trace,
    ) {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let bridge = SensorBridge::new(
            FakeSensor {
                trace: trace.clone(),
                init_ok,
                temperature_c,
                pressure_pa,
            },
            FakeTransmitter {
                trace: trace.clone(),
            },
            FakePanel {
                trace: trace.clone(),
                fail: panel_fail,
            },
            FakeDelay {
                trace: trace.clone(),
            },
        );
        (bridge, trace)
    }

    fn publishes(trace: &Trace) -> Vec<codec::Payload> {
        trace
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Publish(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn cycle_follows_wire_order() {
        let (mut bridge, trace) = bridge(true, false, 25.0, 101_325.0);
        bridge.start().await;
        trace.borrow_mut().clear();

        bridge.run_cycles(1).await;

        let events = trace.borrow();
        assert!(matches!(events[0], Event::ReadTemperature));
        assert!(matches!(events[1], Event::ReadPressure));
        assert!(matches!(events[2], Event::Publish(_)));
        assert!(matches!(events[3], Event::Draw { .. }));
        assert!(matches!(events[4], Event::Draw { .. }));
        assert!(matches!(events[5], Event::Sleep(CYCLE_INTERVAL_MS)));
        assert_eq!(events.len(), 6);
    }

    #[tokio::test]
    async fn publishes_encoded_reading() {
        let (mut bridge, trace) = bridge(true, false, 25.0, 101_325.0);
        bridge.start().await;
        bridge.run_cycles(1).await;

        // 101325 Pa -> 1013.25 hPa; both values scaled by 100, little-endian.
        assert_eq!(publishes(&trace), [[0xC4, 0x09, 0xCD, 0x8B]]);
    }

    #[tokio::test]
    async fn renders_values_at_fixed_positions() {
        let (mut bridge, trace) = bridge(true, false, 25.0, 101_325.0);
        bridge.start().await;
        bridge.run_cycles(1).await;

        let events = trace.borrow();
        assert!(events.contains(&Event::Draw {
            at: layout::TEMPERATURE_VALUE,
            tone: PanelTone::Normal,
            text: StdString::from("25.00C"),
        }));
        assert!(events.contains(&Event::Draw {
            at: layout::PRESSURE_VALUE,
            tone: PanelTone::Normal,
            text: StdString::from("1013.25hPa"),
        }));
    }

    #[tokio::test]
    async fn start_draws_chrome_once() {
        let (mut bridge, trace) = bridge(true, false, 25.0, 101_325.0);
        bridge.start().await;

        let events = trace.borrow();
        assert_eq!(
            *events,
            [
                Event::Draw {
                    at: layout::TITLE,
                    tone: PanelTone::Normal,
                    text: StdString::from("BMP280"),
                },
                Event::Draw {
                    at: layout::TEMPERATURE_LABEL,
                    tone: PanelTone::Normal,
                    text: StdString::from("temperature:"),
                },
                Event::Draw {
                    at: layout::PRESSURE_LABEL,
                    tone: PanelTone::Normal,
                    text: StdString::from("pressure:"),
                },
            ]
        );
        assert!(!bridge.is_degraded());
    }

    #[tokio::test]
    async fn degraded_mode_still_completes_cycles() {
        let (mut bridge, trace) = bridge(false, false, f32::NAN, f32::NAN);
        bridge.start().await;
        assert!(bridge.is_degraded());

        let warned = trace.borrow().contains(&Event::Draw {
            at: layout::SENSOR_WARNING,
            tone: PanelTone::Alert,
            text: StdString::from("Failed BMP280 init."),
        });
        assert!(warned);

        bridge.run_cycles(1).await;
        // NaN readings still produce a (zeroed) payload; the pipeline runs.
        assert_eq!(publishes(&trace), [[0x00; 4]]);
    }

    #[tokio::test]
    async fn panel_failure_does_not_stop_loop() {
        let (mut bridge, trace) = bridge(true, true, 25.0, 101_325.0);
        bridge.start().await;
        bridge.run_cycles(3).await;

        assert_eq!(publishes(&trace).len(), 3);
    }

    #[tokio::test]
    async fn cadence_is_fixed_between_publishes() {
        let (mut bridge, trace) = bridge(true, false, 21.5, 99_800.0);
        bridge.start().await;
        trace.borrow_mut().clear();

        bridge.run_cycles(5).await;

        let events = trace.borrow();
        let sleeps: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                Event::Sleep(ms) => Some(*ms),
                _ => None,
            })
            .collect();
        assert_eq!(sleeps, [CYCLE_INTERVAL_MS; 5]);

        // Exactly one pause separates consecutive publishes: the loop
        // accumulates no extra waits and skips none.
        let mut pauses_since_publish = 0;
        let mut intervals = Vec::new();
        for event in events.iter() {
            match event {
                Event::Sleep(_) => pauses_since_publish += 1,
                Event::Publish(_) => {
                    intervals.push(pauses_since_publish);
                    pauses_since_publish = 0;
                }
                _ => {}
            }
        }
        assert_eq!(intervals, [0, 1, 1, 1, 1]);
    }
}
