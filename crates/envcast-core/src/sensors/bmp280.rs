//! Bosch BMP280 barometric sensor driver (I2C).
//!
//! Register-level driver over `embedded_hal_async::i2c::I2c`. Compensation
//! follows the datasheet integer arithmetic: 32-bit for temperature, 64-bit
//! Q24.8 for pressure.

use embedded_hal_async::i2c::I2c;
use thiserror_no_std::Error;

use super::EnvSensor;

/// I2C address with SDO pulled high.
pub const ADDRESS: u8 = 0x77;

/// I2C address with SDO pulled low; how the M5Stack environment unit is
/// wired, and therefore the default here.
pub const ADDRESS_ALT: u8 = 0x76;

const REG_CALIB_START: u8 = 0x88;
const REG_CHIP_ID: u8 = 0xD0;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA_START: u8 = 0xF7;

const CHIP_ID: u8 = 0x58;

/// ctrl_meas: x16 oversampling on both channels, normal mode.
const CTRL_MEAS_DEFAULT: u8 = 0b101_101_11;

/// config: 0.5 ms standby, IIR filter off.
const CONFIG_DEFAULT: u8 = 0x00;

/// Errors from the raw driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Bmp280Error<E> {
    /// I2C transfer failed.
    #[error("i2c transfer failed")]
    Bus(E),
    /// The device at this address is not a BMP280.
    #[error("unexpected chip id {0:#04x}")]
    BadChipId(u8),
}

impl<E> From<E> for Bmp280Error<E> {
    fn from(err: E) -> Self {
        Self::Bus(err)
    }
}

/// Factory trim block, registers 0x88..0xA0.
#[derive(Debug, Clone, Copy, Default)]
struct Calibration {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,
    dig_p1: u16,
    dig_p2: i16,
    dig_p3: i16,
    dig_p4: i16,
    dig_p5: i16,
    dig_p6: i16,
    dig_p7: i16,
    dig_p8: i16,
    dig_p9: i16,
}

impl Calibration {
    fn parse(raw: &[u8; 24]) -> Self {
        let unsigned = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        let signed = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);
        Self {
            dig_t1: unsigned(0),
            dig_t2: signed(2),
            dig_t3: signed(4),
            dig_p1: unsigned(6),
            dig_p2: signed(8),
            dig_p3: signed(10),
            dig_p4: signed(12),
            dig_p5: signed(14),
            dig_p6: signed(16),
            dig_p7: signed(18),
            dig_p8: signed(20),
            dig_p9: signed(22),
        }
    }

    /// Datasheet 32-bit temperature compensation.
    ///
    /// Returns `(t_fine, centi_degrees)`; `t_fine` feeds the pressure path.
    fn compensate_temperature(&self, adc_t: i32) -> (i32, i32) {
        let var1 = (((adc_t >> 3) - ((self.dig_t1 as i32) << 1)) * self.dig_t2 as i32) >> 11;
        let var2 = ((((adc_t >> 4) - self.dig_t1 as i32) * ((adc_t >> 4) - self.dig_t1 as i32))
            >> 12)
            * self.dig_t3 as i32
            >> 14;
        let t_fine = var1 + var2;
        (t_fine, (t_fine * 5 + 128) >> 8)
    }

    /// Datasheet 64-bit pressure compensation. Returns Pascal in Q24.8.
    fn compensate_pressure(&self, adc_p: i32, t_fine: i32) -> u32 {
        let mut var1 = t_fine as i64 - 128_000;
        let mut var2 = var1 * var1 * self.dig_p6 as i64;
        var2 += (var1 * self.dig_p5 as i64) << 17;
        var2 += (self.dig_p4 as i64) << 35;
        var1 = ((var1 * var1 * self.dig_p3 as i64) >> 8) + ((var1 * self.dig_p2 as i64) << 12);
        var1 = (((1i64 << 47) + var1) * self.dig_p1 as i64) >> 33;
        if var1 == 0 {
            // Blank trim block; the divide below would trap.
            return 0;
        }

        let mut p = 1_048_576 - adc_p as i64;
        p = (((p << 31) - var2) * 3125) / var1;
        var1 = ((self.dig_p9 as i64) * (p >> 13) * (p >> 13)) >> 25;
        var2 = ((self.dig_p8 as i64) * p) >> 19;
        p = ((p + var1 + var2) >> 8) + ((self.dig_p7 as i64) << 4);
        p as u32
    }
}

/// BMP280 over an async I2C bus.
///
/// Mirrors the behavior of the driver the original device ran: a failed
/// [`Bmp280::try_init`] leaves the chip readable, the readings are just
/// compensated against a blank trim block until the next power cycle.
pub struct Bmp280<I> {
    i2c: I,
    address: u8,
    calib: Calibration,
}

impl<I: I2c> Bmp280<I> {
    /// Driver on [`ADDRESS_ALT`] (0x76).
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, ADDRESS_ALT)
    }

    pub fn with_address(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            calib: Calibration::default(),
        }
    }

    /// Probe the chip id, load the trim block, and start continuous
    /// sampling at the x16/x16 defaults.
    pub async fn try_init(&mut self) -> Result<(), Bmp280Error<I::Error>> {
        let id = self.read_reg(REG_CHIP_ID).await?;
        if id != CHIP_ID {
            return Err(Bmp280Error::BadChipId(id));
        }

        let mut raw = [0u8; 24];
        self.i2c
            .write_read(self.address, &[REG_CALIB_START], &mut raw)
            .await?;
        self.calib = Calibration::parse(&raw);

        self.write_reg(REG_CONFIG, CONFIG_DEFAULT).await?;
        self.write_reg(REG_CTRL_MEAS, CTRL_MEAS_DEFAULT).await?;
        Ok(())
    }

    /// Temperature in degrees Celsius.
    pub async fn measure_temperature(&mut self) -> Result<f32, Bmp280Error<I::Error>> {
        let (adc_t, _) = self.read_raw().await?;
        let (_, centi) = self.calib.compensate_temperature(adc_t);
        Ok(centi as f32 / 100.0)
    }

    /// Pressure in Pascal.
    pub async fn measure_pressure(&mut self) -> Result<f32, Bmp280Error<I::Error>> {
        let (adc_t, adc_p) = self.read_raw().await?;
        let (t_fine, _) = self.calib.compensate_temperature(adc_t);
        Ok(self.calib.compensate_pressure(adc_p, t_fine) as f32 / 256.0)
    }

    /// Burst-read both 20-bit ADC words (registers 0xF7..0xFD).
    async fn read_raw(&mut self) -> Result<(i32, i32), Bmp280Error<I::Error>> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_DATA_START], &mut buf)
            .await?;
        let adc_p = ((buf[0] as i32) << 12) | ((buf[1] as i32) << 4) | ((buf[2] as i32) >> 4);
        let adc_t = ((buf[3] as i32) << 12) | ((buf[4] as i32) << 4) | ((buf[5] as i32) >> 4);
        Ok((adc_t, adc_p))
    }

    async fn read_reg(&mut self, reg: u8) -> Result<u8, Bmp280Error<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .await?;
        Ok(buf[0])
    }

    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Bmp280Error<I::Error>> {
        self.i2c.write(self.address, &[reg, value]).await?;
        Ok(())
    }
}

impl<I: I2c> EnvSensor for Bmp280<I> {
    async fn init(&mut self) -> bool {
        match self.try_init().await {
            Ok(()) => true,
            Err(e) => {
                log::error!("BMP280 init failed: {:?}", e);
                false
            }
        }
    }

    async fn read_temperature(&mut self) -> f32 {
        self.measure_temperature().await.unwrap_or(f32::NAN)
    }

    async fn read_pressure_raw(&mut self) -> f32 {
        self.measure_pressure().await.unwrap_or(f32::NAN)
    }
}
