//! Closed joint enumeration for the stick figure.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A joint of the fixed stick-figure hierarchy.
///
/// Discriminants are dense indices into per-joint arrays (`JointAngles`, `JointPoints`,
/// skeleton tables). `Hip` is the single root.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Joint {
    Hip = 0,
    NeckBase,
    Neck,
    Head,
    LeftElbow,
    LeftHand,
    RightElbow,
    RightHand,
    LeftKnee,
    LeftFoot,
    LeftToe,
    RightKnee,
    RightFoot,
    RightToe,
}

impl Joint {
    pub const COUNT: usize = 14;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Hip,
        Joint::NeckBase,
        Joint::Neck,
        Joint::Head,
        Joint::LeftElbow,
        Joint::LeftHand,
        Joint::RightElbow,
        Joint::RightHand,
        Joint::LeftKnee,
        Joint::LeftFoot,
        Joint::LeftToe,
        Joint::RightKnee,
        Joint::RightFoot,
        Joint::RightToe,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Joint> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn is_root(self) -> bool {
        matches!(self, Joint::Hip)
    }

    /// Parent in the fixed hierarchy; `None` for the root.
    pub fn parent(self) -> Option<Joint> {
        use Joint::*;
        match self {
            Hip => None,
            NeckBase => Some(Hip),
            Neck => Some(NeckBase),
            Head => Some(Neck),
            LeftElbow | RightElbow => Some(NeckBase),
            LeftHand => Some(LeftElbow),
            RightHand => Some(RightElbow),
            LeftKnee | RightKnee => Some(Hip),
            LeftFoot => Some(LeftKnee),
            RightFoot => Some(RightKnee),
            LeftToe => Some(LeftFoot),
            RightToe => Some(RightFoot),
        }
    }

    /// Wire name used in exchange documents.
    pub fn name(self) -> &'static str {
        use Joint::*;
        match self {
            Hip => "hip",
            NeckBase => "neckBase",
            Neck => "neck",
            Head => "head",
            LeftElbow => "leftElbow",
            LeftHand => "leftHand",
            RightElbow => "rightElbow",
            RightHand => "rightHand",
            LeftKnee => "leftKnee",
            LeftFoot => "leftFoot",
            LeftToe => "leftToe",
            RightKnee => "rightKnee",
            RightFoot => "rightFoot",
            RightToe => "rightToe",
        }
    }

    pub fn from_name(name: &str) -> Option<Joint> {
        Self::ALL.iter().copied().find(|j| j.name() == name)
    }

    /// Default absolute angle (radians, screen space with +y down) for a joint.
    ///
    /// These are the bone directions of the reference figure built by
    /// `Skeleton::standard`. Imported poses that predate a joint get this value, so
    /// older documents keep animating with a neutral limb instead of a missing one.
    /// The root has no angle and returns `0.0`.
    pub fn rest_angle(self) -> f64 {
        use Joint::*;
        match self {
            Hip => 0.0,
            NeckBase | Neck | Head => -FRAC_PI_2,
            LeftElbow => f64::atan2(20.0, -30.0),
            LeftHand => 3.0 * FRAC_PI_4,
            RightElbow => f64::atan2(20.0, 30.0),
            RightHand => FRAC_PI_4,
            LeftKnee => f64::atan2(45.0, -20.0),
            LeftFoot => f64::atan2(45.0, -10.0),
            LeftToe => PI,
            RightKnee => f64::atan2(45.0, 20.0),
            RightFoot => f64::atan2(45.0, 10.0),
            RightToe => 0.0,
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
