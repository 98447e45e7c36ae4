//! Raw MPU6050 readings and their conversion to physical units.
//!
//! Pure and deterministic: fixed scale divisors and a raw geometric
//! orientation derivation, no filtering or calibration offsets.

use libm::{atan2f, sqrtf};

/// Accelerometer sensitivity at the +-2 g full-scale setting (LSB/g).
pub const ACCEL_LSB_PER_G: f32 = 16384.0;

/// Gyroscope sensitivity at the +-250 deg/s full-scale setting
/// (LSB per deg/s).
pub const GYRO_LSB_PER_DPS: f32 = 131.0;

const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// One raw register read from the sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
    pub temp: i16,
}

/// A sample in physical units plus derived orientation angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionSample {
    /// Acceleration per axis in g.
    pub accel_g: [f32; 3],
    /// Angular rate per axis in deg/s.
    pub gyro_dps: [f32; 3],
    /// Tilt about the X axis, degrees.
    pub roll_deg: f32,
    /// Tilt about the Y axis, degrees.
    pub pitch_deg: f32,
}

impl MotionSample {
    /// Convert a raw reading.
    ///
    /// `roll = atan2(ay, az)`, `pitch = atan2(-ax, sqrt(ay^2 + az^2))`,
    /// both in degrees.
    pub fn from_raw(raw: &RawSample) -> Self {
        let ax = raw.accel[0] as f32 / ACCEL_LSB_PER_G;
        let ay = raw.accel[1] as f32 / ACCEL_LSB_PER_G;
        let az = raw.accel[2] as f32 / ACCEL_LSB_PER_G;

        let gx = raw.gyro[0] as f32 / GYRO_LSB_PER_DPS;
        let gy = raw.gyro[1] as f32 / GYRO_LSB_PER_DPS;
        let gz = raw.gyro[2] as f32 / GYRO_LSB_PER_DPS;

        let roll = atan2f(ay, az) * RAD_TO_DEG;
        let pitch = atan2f(-ax, sqrtf(ay * ay + az * az)) * RAD_TO_DEG;

        Self {
            accel_g: [ax, ay, az],
            gyro_dps: [gx, gy, gz],
            roll_deg: roll,
            pitch_deg: pitch,
        }
    }
}
