//! MPU6050 inertial sensor driver (blocking I2C).
//!
//! Minimal register access: reset/wake on startup, then one 14-byte
//! burst read per sample (accel, temperature, gyro share a contiguous
//! register window starting at `ACCEL_XOUT_H`).

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::Error;
use crate::sample::RawSample;

const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_ACCEL_XOUT_H: u8 = 0x3B;

/// Generic over the I2C implementation so callers pass in their HAL's
/// I2C peripheral.
pub struct Mpu6050<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> Mpu6050<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Device reset followed by wake-up. The part powers up in sleep
    /// mode, so clearing `PWR_MGMT_1` is required before any read
    /// returns live data.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.i2c
            .write(self.addr, &[REG_PWR_MGMT_1, 0x80])
            .map_err(|_| Error::Sensor)?;
        delay.delay_ms(100);
        self.i2c
            .write(self.addr, &[REG_PWR_MGMT_1, 0x00])
            .map_err(|_| Error::Sensor)?;
        delay.delay_ms(10);
        Ok(())
    }

    /// Burst-read accelerometer, temperature and gyro registers.
    pub fn read_raw(&mut self) -> Result<RawSample, Error> {
        let mut buf = [0u8; 14];
        self.i2c
            .write_read(self.addr, &[REG_ACCEL_XOUT_H], &mut buf)
            .map_err(|_| Error::Sensor)?;

        let word = |i: usize| i16::from_be_bytes([buf[i], buf[i + 1]]);

        Ok(RawSample {
            accel: [word(0), word(2), word(4)],
            temp: word(6),
            gyro: [word(8), word(10), word(12)],
        })
    }
}
