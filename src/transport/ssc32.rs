// SSC-32U servo controller board over a serial line
//
// ASCII line protocol: `#<ch> P<us> #<ch> P<us> ... T<ms>\r` moves a group
// of servos together, `STOP<ch>\r` powers one channel down.

use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;

use serialport::{self, SerialPort};
use tracing::{debug, info};

use super::batch::{PendingBatch, ServoTransport, TransportError};

/// Default serial configuration for the board
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Serial link to an SSC-32U servo controller board.
pub struct Ssc32Board {
    port: Box<dyn SerialPort>,
    channels: Vec<u8>,
}

impl Ssc32Board {
    /// Open a connection to the board. `channels` lists every servo channel
    /// in use, so a stop sequence can power each of them down.
    pub fn open(port_name: &str, channels: &[u8]) -> Result<Self, TransportError> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE, channels)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(
        port_name: &str,
        baudrate: u32,
        channels: &[u8],
    ) -> Result<Self, TransportError> {
        info!("Opening servo board on {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port,
            channels: channels.to_vec(),
        })
    }
}

/// Build one group-move command line from a batch.
///
/// The move duration is clamped to the protocol's 16-bit range before
/// serialization.
fn command_line(batch: &PendingBatch, duration_ms: Option<u64>) -> String {
    let mut line = String::new();
    for (channel, micros) in batch.iter() {
        let _ = write!(line, "#{channel} P{micros} ");
    }
    if let Some(ms) = duration_ms {
        let _ = write!(line, "T{}", ms.min(u64::from(u16::MAX)));
    }
    line.push('\r');
    line
}

fn stop_command(channel: u8) -> String {
    format!("STOP{channel}\r")
}

impl ServoTransport for Ssc32Board {
    fn commit(
        &mut self,
        batch: &PendingBatch,
        duration_ms: Option<u64>,
    ) -> Result<(), TransportError> {
        if batch.is_empty() {
            return Ok(());
        }

        let line = command_line(batch, duration_ms);
        debug!(targets = batch.len(), "sending {:?}", line.trim_end());
        self.port.write_all(line.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), TransportError> {
        info!("Powering down {} servo channels", self.channels.len());
        for &channel in &self.channels {
            self.port.write_all(stop_command(channel).as_bytes())?;
        }
        self.port.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_groups_all_targets() {
        let mut batch = PendingBatch::new();
        batch.set(0, 1500);
        batch.set(3, 2111);
        batch.set(11, 900);

        let line = command_line(&batch, Some(500));
        assert_eq!(line, "#0 P1500 #3 P2111 #11 P900 T500\r");
    }

    #[test]
    fn command_line_without_duration() {
        let mut batch = PendingBatch::new();
        batch.set(7, 1234);

        let line = command_line(&batch, None);
        assert_eq!(line, "#7 P1234 \r");
    }

    #[test]
    fn move_duration_is_clamped_to_u16() {
        let mut batch = PendingBatch::new();
        batch.set(0, 1500);

        let line = command_line(&batch, Some(1_000_000));
        assert_eq!(line, "#0 P1500 T65535\r");
    }

    #[test]
    fn stop_command_format() {
        assert_eq!(stop_command(0), "STOP0\r");
        assert_eq!(stop_command(31), "STOP31\r");
    }
}
