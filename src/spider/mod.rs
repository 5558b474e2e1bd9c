// Spider robot model
//
// Provides:
// - Three-segment leg inverse kinematics (toe position -> joint angles)
// - Per-servo pulse-width calibration
// - The assembled four-leg rig with its servo channel table

pub mod leg;
pub mod rig;
pub mod servo;

pub use leg::{Joint, JointAngles, KinematicsError, Leg, LegPosition, Point3D};
pub use rig::{RobotRig, SERVO_CHANNELS, default_calibration, servo_channel};
pub use servo::ServoCalibration;
