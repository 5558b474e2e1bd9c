// PCA9685 16-channel PWM driver over I2C
//
// Register map and prescale values assume the chip's 25MHz internal clock,
// configured for a 50Hz servo refresh.

use embedded_hal::i2c::I2c;
use tracing::{debug, info};

use super::batch::{PendingBatch, ServoTransport, TransportError};

/// The I2C address which this device listens to by default.
pub const ADDRESS: u8 = 0x40;

// Register addresses.
const REG_MODE1: u8 = 0x00;
const REG_PWM0_ON_L: u8 = 0x06;
const REG_ALL_PWM_ON_L: u8 = 0xFA;
const REG_PRESCALE: u8 = 0xFE;

// MODE1 bit values.
const MODE1_SLEEP: u8 = 1 << 4;
const MODE1_AI: u8 = 1 << 5;
const MODE1_RESTART: u8 = 1 << 7;

// OFF_H bit that forces a channel fully off.
const FULL_OFF: u8 = 1 << 4;

/// Prescale for a 50Hz frame, assuming the 25MHz internal clock.
const PRESCALE_SERVO: u8 = 121;

/// One 50Hz PWM frame is 20000us spread over a 12-bit counter.
const PERIOD_MICROS: f64 = 20_000.0;
const TICKS_PER_PERIOD: f64 = 4096.0;

/// PCA9685 driver, generic over the I2C bus implementation.
pub struct Pca9685<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Pca9685<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Program the chip for 50Hz servo output.
    ///
    /// The prescale register is only writable while the oscillator sleeps,
    /// so: sleep, set prescale, wake with auto-increment, then restart PWM.
    pub fn configure(&mut self) -> Result<(), TransportError> {
        info!("Configuring PCA9685 at 0x{:02X} for 50Hz servo output", self.address);
        self.write_reg(REG_MODE1, MODE1_SLEEP)?;
        self.write_reg(REG_PRESCALE, PRESCALE_SERVO)?;
        self.write_reg(REG_MODE1, MODE1_AI)?;
        // The oscillator needs 500us after waking before RESTART is honored.
        std::thread::sleep(std::time::Duration::from_micros(500));
        self.write_reg(REG_MODE1, MODE1_AI | MODE1_RESTART)?;
        Ok(())
    }

    /// Set one channel's pulse width in microseconds.
    pub fn set_pin(&mut self, channel: u8, micros: u16) -> Result<(), TransportError> {
        let off = micros_to_ticks(micros);
        debug!(channel, micros, ticks = off, "setting pwm channel");
        let reg = REG_PWM0_ON_L + 4 * channel;
        self.i2c
            .write(self.address, &[reg, 0, 0, (off & 0xFF) as u8, (off >> 8) as u8])
            .map_err(to_bus_error)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(to_bus_error)
    }
}

fn to_bus_error<E: core::fmt::Debug>(err: E) -> TransportError {
    TransportError::I2c(format!("{err:?}"))
}

/// Convert a pulse width in microseconds to 12-bit timer ticks.
fn micros_to_ticks(micros: u16) -> u16 {
    let ticks = (f64::from(micros) * TICKS_PER_PERIOD / PERIOD_MICROS).round();
    ticks.clamp(0.0, TICKS_PER_PERIOD - 1.0) as u16
}

impl<I2C: I2c> ServoTransport for Pca9685<I2C> {
    fn commit(
        &mut self,
        batch: &PendingBatch,
        _duration_ms: Option<u64>,
    ) -> Result<(), TransportError> {
        // The chip has no grouped timed moves; targets take effect on the
        // next PWM frame. Pulse targets are idempotent, so a batch that
        // fails partway is safely resent in full by the caller.
        for (channel, micros) in batch.iter() {
            self.set_pin(channel, micros)?;
        }
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), TransportError> {
        info!("Dropping all PWM outputs");
        self.i2c
            .write(self.address, &[REG_ALL_PWM_ON_L, 0, 0, 0, FULL_OFF])
            .map_err(to_bus_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, Operation};

    /// Records every register write issued over the bus.
    #[derive(Default)]
    struct MockI2c {
        writes: Vec<(u8, Vec<u8>)>,
    }

    impl embedded_hal::i2c::ErrorType for MockI2c {
        type Error = ErrorKind;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                if let Operation::Write(bytes) = op {
                    self.writes.push((address, bytes.to_vec()));
                }
            }
            Ok(())
        }
    }

    #[test]
    fn micros_to_ticks_scales_to_50hz_frame() {
        assert_eq!(micros_to_ticks(0), 0);
        assert_eq!(micros_to_ticks(1500), 307);
        assert_eq!(micros_to_ticks(2500), 512);
        // A full frame saturates the 12-bit counter.
        assert_eq!(micros_to_ticks(20_000), 4095);
        assert_eq!(micros_to_ticks(u16::MAX), 4095);
    }

    #[test]
    fn configure_programs_prescale_while_asleep() {
        let mut pwm = Pca9685::new(MockI2c::default());
        pwm.configure().unwrap();

        let writes: Vec<&[u8]> = pwm.i2c.writes.iter().map(|(_, w)| w.as_slice()).collect();
        assert_eq!(
            writes,
            vec![
                &[REG_MODE1, MODE1_SLEEP][..],
                &[REG_PRESCALE, PRESCALE_SERVO][..],
                &[REG_MODE1, MODE1_AI][..],
                &[REG_MODE1, MODE1_AI | MODE1_RESTART][..],
            ]
        );
        assert!(pwm.i2c.writes.iter().all(|(addr, _)| *addr == ADDRESS));
    }

    #[test]
    fn set_pin_writes_channel_registers() {
        let mut pwm = Pca9685::new(MockI2c::default());
        pwm.set_pin(2, 1500).unwrap();

        // Channel 2 starts at register 0x06 + 4*2, on-time zero, off-time of
        // 307 ticks in little-endian.
        assert_eq!(pwm.i2c.writes, vec![(ADDRESS, vec![0x0E, 0, 0, 51, 1])]);
    }

    #[test]
    fn commit_applies_each_staged_target() {
        let mut pwm = Pca9685::new(MockI2c::default());
        let mut batch = PendingBatch::new();
        batch.set(0, 1000);
        batch.set(1, 2000);

        pwm.commit(&batch, None).unwrap();
        assert_eq!(pwm.i2c.writes.len(), 2);
        assert_eq!(pwm.i2c.writes[0].1[0], REG_PWM0_ON_L);
        assert_eq!(pwm.i2c.writes[1].1[0], REG_PWM0_ON_L + 4);
    }

    #[test]
    fn stop_all_forces_every_channel_off() {
        let mut pwm = Pca9685::new(MockI2c::default());
        pwm.stop_all().unwrap();
        assert_eq!(pwm.i2c.writes, vec![(ADDRESS, vec![REG_ALL_PWM_ON_L, 0, 0, 0, FULL_OFF])]);
    }
}
