// Fixed-period control loop driving the rig over a servo transport
//
// Each tick: advance the scripted sway, solve all four legs, convert the
// angles to pulse widths, and commit one batch. A failed commit keeps the
// pending batch, so the next tick naturally resends the same state.

use std::f64::consts::PI;
use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};

use crate::config::LOOP_HZ;
use crate::spider::{Point3D, RobotRig};
use crate::transport::{PendingBatch, ServoTransport, TransportError};

/// Per-tick phase advance; one full sway cycle per second at 100Hz.
const PHASE_STEP: f64 = PI / 50.0;

pub struct Runtime {
    rig: RobotRig,
    transport: Box<dyn ServoTransport>,
    pending: PendingBatch,
    phase: f64,
}

impl Runtime {
    pub fn new(rig: RobotRig, transport: Box<dyn ServoTransport>) -> Self {
        Self {
            rig,
            transport,
            pending: PendingBatch::new(),
            phase: 0.0,
        }
    }

    /// Toe targets for the current phase: a small horizontal circle with a
    /// gentle vertical bob, applied to all four toes around their rest pose.
    fn sway_pose(&self) -> [Point3D; 4] {
        let toe = Point3D::new(
            self.phase.sin() * 20.0,
            self.phase.cos() * 20.0,
            (self.phase / 2.0).sin() * 5.0,
        );
        [toe; 4]
    }

    fn tick(&mut self) {
        self.phase += PHASE_STEP;
        let pose = self.sway_pose();
        self.rig.stage_pose(&mut self.pending, &pose);

        if self.pending.is_empty() {
            return;
        }
        match self.transport.commit(&self.pending, None) {
            Ok(()) => self.pending.clear(),
            Err(err) => warn!("commit failed, retrying next tick: {err}"),
        }
    }

    pub async fn run(mut self) -> Result<(), TransportError> {
        let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
        let mut shutdown = Box::pin(tokio::signal::ctrl_c());

        info!("Runtime started: {}Hz control loop", LOOP_HZ);
        loop {
            tokio::select! {
                _ = tick.tick() => self.tick(),
                _ = &mut shutdown => {
                    info!("Shutting down, powering servos off");
                    self.transport.stop_all()?;
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Transport that counts commits and can be told to fail.
    #[derive(Clone, Default)]
    struct FlakyTransport {
        fail: Rc<Cell<bool>>,
        commits: Rc<Cell<usize>>,
        stops: Rc<Cell<usize>>,
    }

    impl ServoTransport for FlakyTransport {
        fn commit(
            &mut self,
            _batch: &PendingBatch,
            _duration_ms: Option<u64>,
        ) -> Result<(), TransportError> {
            if self.fail.get() {
                return Err(TransportError::I2c("injected".into()));
            }
            self.commits.set(self.commits.get() + 1);
            Ok(())
        }

        fn stop_all(&mut self) -> Result<(), TransportError> {
            self.stops.set(self.stops.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn tick_commits_and_clears_the_batch() {
        let transport = FlakyTransport::default();
        let mut runtime = Runtime::new(RobotRig::new(), Box::new(transport.clone()));

        runtime.tick();
        assert_eq!(transport.commits.get(), 1);
        assert!(runtime.pending.is_empty());
    }

    #[test]
    fn failed_commit_retains_pending_state_for_retry() {
        let transport = FlakyTransport::default();
        let mut runtime = Runtime::new(RobotRig::new(), Box::new(transport.clone()));

        transport.fail.set(true);
        runtime.tick();
        assert_eq!(transport.commits.get(), 0);
        assert_eq!(runtime.pending.len(), 12);

        // The link recovers and the next tick flushes the retained targets.
        transport.fail.set(false);
        runtime.tick();
        assert_eq!(transport.commits.get(), 1);
        assert!(runtime.pending.is_empty());
    }
}
