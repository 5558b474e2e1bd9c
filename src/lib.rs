// Quadruped spider robot control: leg inverse kinematics, servo pulse
// calibration, and the transports that carry commands to the hardware.

pub mod config;
pub mod runtime;
pub mod spider;
pub mod transport;
