// Servo pulse-width calibration
//
// Maps a joint angle to the microsecond pulse that puts the horn there,
// honoring each servo's mechanical limits and mounting direction.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pulse step per degree of horn rotation (100us per 9 degrees, the usual
/// hobby servo scale).
const MICROS_PER_DEG: f64 = 100.0 / 9.0;

/// Per-servo calibration record.
///
/// The calibration reference is 90 degrees: `ninety_deg_micros` is the pulse
/// width that puts the joint at 90 degrees, and every angle is offset against
/// that reference. `reversed` flips the offset for servos mounted mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoCalibration {
    pub min_micros: u16,
    pub max_micros: u16,
    pub ninety_deg_micros: i16,
    #[serde(default)]
    pub reversed: bool,
}

impl ServoCalibration {
    pub const fn new(
        min_micros: u16,
        max_micros: u16,
        ninety_deg_micros: i16,
        reversed: bool,
    ) -> Self {
        Self {
            min_micros,
            max_micros,
            ninety_deg_micros,
            reversed,
        }
    }

    /// Convert a joint angle in degrees to a pulse width in microseconds.
    ///
    /// Angles that land outside the servo's physical range are clamped to the
    /// nearest limit; commanding past a hard stop must never be an error.
    pub fn degrees_to_micros(&self, degrees: f64) -> u16 {
        let offset = if self.reversed {
            90.0 - degrees
        } else {
            degrees - 90.0
        };
        let micros = (offset * MICROS_PER_DEG).round() as i32 + i32::from(self.ninety_deg_micros);
        let clamped = micros.clamp(i32::from(self.min_micros), i32::from(self.max_micros));
        if clamped != micros {
            debug!(micros, clamped, "pulse width clamped to servo limits");
        }
        clamped as u16
    }

    /// Convert a joint angle in radians (the solver's output unit).
    pub fn radians_to_micros(&self, radians: f64) -> u16 {
        self.degrees_to_micros(radians.to_degrees())
    }
}
