// Three-segment leg inverse kinematics
//
// Each leg is a coxa-femur-tibia chain joined to the body at a fixed hip
// point. The canonical toe position (0,0,0) has the coxa at 45 degrees to
// the body, the femur horizontal, and the tibia vertical.

use crate::config::{COXA_LEN, FEMUR_LEN, TIBIA_LEN};

/// Slack on the reachability bounds, in millimeters.
const REACH_TOLERANCE: f64 = 1e-9;

/// A point in the robot body frame.
///
/// X is towards the right of the robot.
/// Y is towards the front of the robot.
/// Z is towards the top of the robot.
/// Distances are in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Leg mount positions, one per body corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegPosition {
    FrontRight = 0,
    FrontLeft = 1,
    BackRight = 2,
    BackLeft = 3,
}

impl LegPosition {
    pub const ALL: [LegPosition; 4] = [
        LegPosition::FrontRight,
        LegPosition::FrontLeft,
        LegPosition::BackRight,
        LegPosition::BackLeft,
    ];
}

/// Joints within a leg, in servo connection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    BodyCoxa = 0,
    CoxaFemur = 1,
    FemurTibia = 2,
}

impl Joint {
    pub const ALL: [Joint; 3] = [Joint::BodyCoxa, Joint::CoxaFemur, Joint::FemurTibia];
}

/// Solved joint angles for one leg, in radians.
///
/// `body_coxa` is measured counter-clockwise from the body X axis.
/// `coxa_femur` is measured counter-clockwise from horizontal, so up is
/// positive and down is negative.
/// `femur_tibia` is the opening of the knee, always in [0, pi]; bigger
/// numbers represent a further reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngles {
    pub body_coxa: f64,
    pub coxa_femur: f64,
    pub femur_tibia: f64,
}

/// Error types for the leg solver
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error(
        "toe target out of reach: femur-tibia span {ft_reach:.1}mm outside [{min_reach:.1}, {max_reach:.1}]mm"
    )]
    UnreachablePosition {
        ft_reach: f64,
        min_reach: f64,
        max_reach: f64,
    },
}

/// One leg of the robot. Holds only the fixed hip mount point; the toe
/// target is supplied on each solve call.
#[derive(Debug, Clone, Copy)]
pub struct Leg {
    hip_pt: Point3D,
}

impl Leg {
    pub fn new(pos: LegPosition) -> Self {
        // The canonical zero position of the toe is with the coxa at "45
        // degrees", the femur horizontal, and the tibia vertical. Therefore
        // the hip joint is displaced by (coxa+femur)/sqrt(2) on each body
        // axis, using Pythagoras' theorem.
        let hip_offset = (COXA_LEN + FEMUR_LEN) / f64::sqrt(2.0);
        let (sx, sy) = match pos {
            LegPosition::FrontRight => (-1.0, -1.0),
            LegPosition::FrontLeft => (1.0, -1.0),
            LegPosition::BackRight => (-1.0, 1.0),
            LegPosition::BackLeft => (1.0, 1.0),
        };
        Self {
            hip_pt: Point3D::new(sx * hip_offset, sy * hip_offset, TIBIA_LEN),
        }
    }

    /// The fixed hip mount point in the body frame.
    pub fn hip_pt(&self) -> Point3D {
        self.hip_pt
    }

    /// Solve the three joint angles that place the toe at `toe_pt`.
    pub fn joint_angles(&self, toe_pt: Point3D) -> Result<JointAngles, KinematicsError> {
        // Hip angle is measured counter-clockwise from a line projecting out
        // from the right side of the robot.
        let body_coxa = f64::atan2(toe_pt.y - self.hip_pt.y, toe_pt.x - self.hip_pt.x);

        // Total horizontal distance from hip to toe.
        let horiz_reach = f64::hypot(toe_pt.x - self.hip_pt.x, toe_pt.y - self.hip_pt.y);
        // Femur+tibia horizontal reach. May be negative when the toe is
        // pulled in under the coxa; that is still solvable.
        let ft_horiz_reach = horiz_reach - COXA_LEN;
        // Femur+tibia reach in 3D space. This gives us a triangle with sides
        // (FEMUR_LEN, TIBIA_LEN, ft_reach).
        let ft_reach = f64::hypot(ft_horiz_reach, toe_pt.z - self.hip_pt.z);

        // The triangle only closes when ft_reach is between the links folded
        // together and fully extended. Outside that range the law-of-cosines
        // arguments leave [-1, 1], so check before taking any arccosine. The
        // tolerance absorbs rounding accumulated through the two hypots; it
        // is far below any mechanically meaningful distance.
        let min_reach = (FEMUR_LEN - TIBIA_LEN).abs();
        let max_reach = FEMUR_LEN + TIBIA_LEN;
        if ft_reach < min_reach - REACH_TOLERANCE || ft_reach > max_reach + REACH_TOLERANCE {
            return Err(KinematicsError::UnreachablePosition {
                ft_reach,
                min_reach,
                max_reach,
            });
        }

        // Solve the interior angles using the law of cosines:
        //   c^2 = a^2 + b^2 - 2*a*b*cos(C)
        //   cos(C) = (a^2 + b^2 - c^2) / (2*a*b)
        // The reach check above bounds both arguments; the clamp only absorbs
        // float rounding at the exact boundaries.

        // Angle between the femur and the line from the coxa-femur joint down
        // to the toe.
        let cos_num = ft_reach * ft_reach + FEMUR_LEN * FEMUR_LEN - TIBIA_LEN * TIBIA_LEN;
        let cos_denom = 2.0 * ft_reach * FEMUR_LEN;
        let femur_reach_angle = f64::acos((cos_num / cos_denom).clamp(-1.0, 1.0));

        // Elevation of that same hip-to-toe line above horizontal.
        let reach_angle = f64::atan2(toe_pt.z - self.hip_pt.z, ft_horiz_reach);
        let coxa_femur = femur_reach_angle + reach_angle;

        let cos_num = FEMUR_LEN * FEMUR_LEN + TIBIA_LEN * TIBIA_LEN - ft_reach * ft_reach;
        let cos_denom = 2.0 * FEMUR_LEN * TIBIA_LEN;
        let femur_tibia = f64::acos((cos_num / cos_denom).clamp(-1.0, 1.0));

        Ok(JointAngles {
            body_coxa,
            coxa_femur,
            femur_tibia,
        })
    }
}
