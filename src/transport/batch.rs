// Pending servo updates, batched per control tick

use std::collections::BTreeMap;

use tracing::info;

/// Error types for the servo hardware links
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("i2c bus error: {0}")]
    I2c(String),
}

/// Servo pulse targets accumulated since the last successful commit.
///
/// Kept sorted by channel so serialized commands come out in a deterministic
/// order. Setting a channel twice before a commit keeps only the latest
/// target.
#[derive(Debug, Clone, Default)]
pub struct PendingBatch {
    targets: BTreeMap<u8, u16>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a pulse target for one channel, replacing any earlier target.
    pub fn set(&mut self, channel: u8, micros: u16) {
        self.targets.insert(channel, micros);
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    /// Staged (channel, microseconds) pairs in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u16)> + '_ {
        self.targets.iter().map(|(&channel, &micros)| (channel, micros))
    }
}

/// A hardware link that can apply a batch of servo targets.
///
/// `commit` sends the whole batch as one hardware-bound update. On success
/// the caller clears the batch; on failure the caller keeps it untouched so
/// the next tick resends the same pending state.
pub trait ServoTransport {
    /// Apply every staged target, optionally spreading the move over
    /// `duration_ms` where the hardware supports timed moves.
    fn commit(&mut self, batch: &PendingBatch, duration_ms: Option<u64>)
    -> Result<(), TransportError>;

    /// Power down all actuators cleanly.
    fn stop_all(&mut self) -> Result<(), TransportError>;
}

/// Transport that only logs, for running without hardware attached.
#[derive(Debug, Default)]
pub struct NullTransport;

impl ServoTransport for NullTransport {
    fn commit(
        &mut self,
        batch: &PendingBatch,
        duration_ms: Option<u64>,
    ) -> Result<(), TransportError> {
        info!(targets = batch.len(), ?duration_ms, "dry-run commit");
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), TransportError> {
        info!("dry-run stop");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_keeps_latest_target_per_channel() {
        let mut batch = PendingBatch::new();
        assert!(batch.is_empty());

        batch.set(3, 1500);
        batch.set(3, 1600);
        batch.set(0, 900);

        assert_eq!(batch.len(), 2);
        let staged: Vec<_> = batch.iter().collect();
        assert_eq!(staged, vec![(0, 900), (3, 1600)]);
    }

    #[test]
    fn batch_clear_empties_all_targets() {
        let mut batch = PendingBatch::new();
        batch.set(1, 1500);
        batch.set(2, 1500);
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.iter().count(), 0);
    }
}
