// Robot geometry, loop timing, and hardware configuration

use std::fs;
use std::path::Path;

use crate::spider::ServoCalibration;

// Leg link lengths in millimeters, fixed for this robot.
pub const COXA_LEN: f64 = 23.5;
pub const FEMUR_LEN: f64 = 38.0;
pub const TIBIA_LEN: f64 = 81.0;

// Control loop frequency (10ms period, long enough to absorb serial latency)
pub const LOOP_HZ: u64 = 100;

// Serial port for the SSC-32U servo controller board
pub const SERIAL_PORT: &str = "/dev/rfcomm0";
pub const SERIAL_BAUD: u32 = 9600;

// I2C bus and address for the PCA9685 PWM driver
pub const I2C_DEV: &str = "/dev/i2c-1";
pub const PCA9685_ADDR: u8 = 0x40;

/// Error types for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read calibration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse calibration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("calibration file must list exactly 12 servos, got {0}")]
    BadServoCount(usize),
}

/// Load a per-robot servo calibration table from a JSON file: an array of 12
/// entries in channel order.
pub fn load_servo_table(path: impl AsRef<Path>) -> Result<[ServoCalibration; 12], ConfigError> {
    let raw = fs::read_to_string(path)?;
    servo_table_from_json(&raw)
}

/// Parse a calibration table from its JSON text.
pub fn servo_table_from_json(raw: &str) -> Result<[ServoCalibration; 12], ConfigError> {
    let entries: Vec<ServoCalibration> = serde_json::from_str(raw)?;
    let count = entries.len();
    entries
        .try_into()
        .map_err(|_| ConfigError::BadServoCount(count))
}
