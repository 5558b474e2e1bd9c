// The assembled robot: four legs plus the 12-servo calibration table
//
// Owns everything needed to turn toe targets into channel/pulse commands.
// Built once at startup and passed by reference; there is no global robot.

use tracing::warn;

use super::leg::{Joint, JointAngles, KinematicsError, Leg, LegPosition, Point3D};
use super::servo::ServoCalibration;
use crate::transport::PendingBatch;

/// Servo channel assignments, indexed by [leg position][joint].
pub const SERVO_CHANNELS: [[u8; 3]; 4] = [
    [0, 1, 2],   // front right
    [3, 4, 5],   // front left
    [6, 7, 8],   // back right
    [9, 10, 11], // back left
];

/// Look up the hardware channel driving one joint.
pub fn servo_channel(pos: LegPosition, joint: Joint) -> u8 {
    SERVO_CHANNELS[pos as usize][joint as usize]
}

/// The four-legged rig: leg geometry plus servo calibration, addressed
/// through the channel table.
pub struct RobotRig {
    legs: [Leg; 4],
    servos: [ServoCalibration; 12],
}

impl RobotRig {
    /// Build a rig with this robot's factory calibration.
    pub fn new() -> Self {
        Self::with_calibration(default_calibration())
    }

    /// Build a rig with a custom calibration table, in channel order.
    pub fn with_calibration(servos: [ServoCalibration; 12]) -> Self {
        Self {
            legs: LegPosition::ALL.map(Leg::new),
            servos,
        }
    }

    pub fn leg(&self, pos: LegPosition) -> &Leg {
        &self.legs[pos as usize]
    }

    pub fn servo(&self, pos: LegPosition, joint: Joint) -> &ServoCalibration {
        &self.servos[servo_channel(pos, joint) as usize]
    }

    /// Every channel the rig drives, in channel order.
    pub fn channels(&self) -> [u8; 12] {
        let mut channels = [0u8; 12];
        let mut i = 0;
        for row in SERVO_CHANNELS {
            for channel in row {
                channels[i] = channel;
                i += 1;
            }
        }
        channels
    }

    /// Solve one leg's joint angles for a toe target in the body frame.
    pub fn solve_leg(
        &self,
        pos: LegPosition,
        toe_pt: Point3D,
    ) -> Result<JointAngles, KinematicsError> {
        self.legs[pos as usize].joint_angles(toe_pt)
    }

    /// Convert one leg's toe target into (channel, pulse width) commands.
    pub fn leg_pulses(
        &self,
        pos: LegPosition,
        toe_pt: Point3D,
    ) -> Result<[(u8, u16); 3], KinematicsError> {
        let angles = self.solve_leg(pos, toe_pt)?;
        Ok([
            (
                servo_channel(pos, Joint::BodyCoxa),
                self.servo(pos, Joint::BodyCoxa).radians_to_micros(angles.body_coxa),
            ),
            (
                servo_channel(pos, Joint::CoxaFemur),
                self.servo(pos, Joint::CoxaFemur).radians_to_micros(angles.coxa_femur),
            ),
            (
                servo_channel(pos, Joint::FemurTibia),
                self.servo(pos, Joint::FemurTibia).radians_to_micros(angles.femur_tibia),
            ),
        ])
    }

    /// Stage one leg's servo targets into a pending batch.
    pub fn stage_leg(
        &self,
        batch: &mut PendingBatch,
        pos: LegPosition,
        toe_pt: Point3D,
    ) -> Result<(), KinematicsError> {
        for (channel, micros) in self.leg_pulses(pos, toe_pt)? {
            batch.set(channel, micros);
        }
        Ok(())
    }

    /// Stage a full body pose, one toe target per leg.
    ///
    /// An unreachable target drops that leg from the batch; the other legs
    /// still move. Returns the number of legs staged.
    pub fn stage_pose(&self, batch: &mut PendingBatch, toes: &[Point3D; 4]) -> usize {
        let mut staged = 0;
        for pos in LegPosition::ALL {
            match self.stage_leg(batch, pos, toes[pos as usize]) {
                Ok(()) => staged += 1,
                Err(err) => warn!(leg = ?pos, "leg skipped: {err}"),
            }
        }
        staged
    }
}

impl Default for RobotRig {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory calibration for this particular robot, in channel order.
/// Override with a calibration file for a different build.
pub fn default_calibration() -> [ServoCalibration; 12] {
    [
        // front right: body-coxa, coxa-femur, femur-tibia
        ServoCalibration::new(1500, 2500, 1700, true),
        ServoCalibration::new(1200, 2600, 2111, false),
        ServoCalibration::new(1400, 2500, 1900, false),
        // front left
        ServoCalibration::new(700, 1700, 1611, false),
        ServoCalibration::new(500, 1900, 1045, true),
        ServoCalibration::new(1300, 2400, 1900, true),
        // back right
        ServoCalibration::new(700, 1700, 1800, false),
        ServoCalibration::new(700, 2100, 1189, true),
        ServoCalibration::new(1500, 2500, 2155, true),
        // back left
        ServoCalibration::new(1400, 2400, 2500, false),
        ServoCalibration::new(1000, 2200, 1600, false),
        ServoCalibration::new(1100, 2200, 1600, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_table_covers_all_twelve_servos() {
        let mut seen = [false; 12];
        for pos in LegPosition::ALL {
            for joint in Joint::ALL {
                seen[servo_channel(pos, joint) as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));

        let rig = RobotRig::new();
        assert_eq!(rig.channels(), [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn leg_pulses_at_rest_pose() {
        // At the canonical rest toe the front-right leg solves to
        // (45, 0, 90) degrees; push those through the factory calibration.
        let rig = RobotRig::new();
        let pulses = rig.leg_pulses(LegPosition::FrontRight, Point3D::default()).unwrap();

        // body-coxa: reversed, 90-45 = 45deg above reference -> 2200.
        assert_eq!(pulses[0], (0, 2200));
        // coxa-femur: 0deg is 1000us below the 2111 reference, clamped to
        // the servo's 1200us floor.
        assert_eq!(pulses[1], (1, 1200));
        // femur-tibia: 90deg maps straight to the reference pulse.
        assert_eq!(pulses[2], (2, 1900));
    }

    #[test]
    fn stage_pose_skips_only_the_unreachable_leg() {
        let rig = RobotRig::new();
        let mut batch = PendingBatch::new();

        let rest = Point3D::default();
        // Front-left toe far below anything the leg can reach.
        let toes = [rest, Point3D::new(0.0, 0.0, -500.0), rest, rest];

        let staged = rig.stage_pose(&mut batch, &toes);
        assert_eq!(staged, 3);
        assert_eq!(batch.len(), 9);
        // Front-left channels stay unstaged.
        let staged_channels: Vec<u8> = batch.iter().map(|(c, _)| c).collect();
        assert_eq!(staged_channels, vec![0, 1, 2, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn stage_pose_at_rest_fills_the_batch() {
        let rig = RobotRig::new();
        let mut batch = PendingBatch::new();
        let staged = rig.stage_pose(&mut batch, &[Point3D::default(); 4]);
        assert_eq!(staged, 4);
        assert_eq!(batch.len(), 12);
    }
}
