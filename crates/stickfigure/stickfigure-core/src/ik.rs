//! Analytic inverse kinematics, one independent chain per end effector.
//!
//! Chains never interact: dragging the left hand rewrites only the left elbow and
//! hand angles even though both arms hang off the same base joint. This is a
//! per-limb solver, not a full-body one.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::joint::Joint;
use crate::kinematics::points_from_pose;
use crate::pose::{Point, Pose};
use crate::skeleton::Skeleton;

/// Default distance clamp margin for [`solve_two_joint_ik`].
pub const DEFAULT_IK_EPSILON: f64 = 1e-6;

/// Two-bone law-of-cosines solve. Returns the absolute angles of the first and
/// second bone.
///
/// The base-target distance is clamped to `[eps, l1 + l2 - eps]`, so unreachable
/// targets give a fully extended limb pointing at the target and a target on the
/// base gives a folded one. Never produces NaN for positive bone lengths.
pub fn solve_two_joint_ik(target: Point, base: Point, l1: f64, l2: f64) -> [f64; 2] {
    solve_two_joint_ik_with_epsilon(target, base, l1, l2, DEFAULT_IK_EPSILON)
}

pub fn solve_two_joint_ik_with_epsilon(
    target: Point,
    base: Point,
    l1: f64,
    l2: f64,
    eps: f64,
) -> [f64; 2] {
    let delta = target - base;
    let reach = (l1 + l2 - eps).max(eps);
    let d = delta.length().clamp(eps, reach);

    let a1 = ((l1 * l1 + d * d - l2 * l2) / (2.0 * l1 * d))
        .clamp(-1.0, 1.0)
        .acos();
    let a2 = ((l1 * l1 + l2 * l2 - d * d) / (2.0 * l1 * l2))
        .clamp(-1.0, 1.0)
        .acos();

    let base_angle = delta.y.atan2(delta.x);
    let joint1 = base_angle - a1;
    let joint2 = joint1 + (PI - a2);
    [joint1, joint2]
}

/// Leaf joints that IK drives directly.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndEffector {
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
    LeftToe,
    RightToe,
}

/// Joints rewritten when solving for an effector, plus the fixed joint they hang from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IkChain {
    TwoBone { base: Joint, joints: [Joint; 2] },
    Single { base: Joint, joint: Joint },
}

impl IkChain {
    pub fn base(&self) -> Joint {
        match *self {
            IkChain::TwoBone { base, .. } | IkChain::Single { base, .. } => base,
        }
    }

    pub fn joints(&self) -> &[Joint] {
        match self {
            IkChain::TwoBone { joints, .. } => joints,
            IkChain::Single { joint, .. } => std::slice::from_ref(joint),
        }
    }
}

impl EndEffector {
    pub const ALL: [EndEffector; 6] = [
        EndEffector::LeftHand,
        EndEffector::RightHand,
        EndEffector::LeftFoot,
        EndEffector::RightFoot,
        EndEffector::LeftToe,
        EndEffector::RightToe,
    ];

    pub fn joint(self) -> Joint {
        match self {
            EndEffector::LeftHand => Joint::LeftHand,
            EndEffector::RightHand => Joint::RightHand,
            EndEffector::LeftFoot => Joint::LeftFoot,
            EndEffector::RightFoot => Joint::RightFoot,
            EndEffector::LeftToe => Joint::LeftToe,
            EndEffector::RightToe => Joint::RightToe,
        }
    }

    pub fn from_joint(joint: Joint) -> Option<EndEffector> {
        Self::ALL.into_iter().find(|e| e.joint() == joint)
    }

    /// The chain this effector solves. The base of each two-bone chain is the parent
    /// of its first joint, so both bone lengths come straight from the skeleton.
    pub fn chain(self) -> IkChain {
        use Joint::*;
        match self {
            EndEffector::LeftHand => IkChain::TwoBone {
                base: NeckBase,
                joints: [LeftElbow, LeftHand],
            },
            EndEffector::RightHand => IkChain::TwoBone {
                base: NeckBase,
                joints: [RightElbow, RightHand],
            },
            EndEffector::LeftFoot => IkChain::TwoBone {
                base: Hip,
                joints: [LeftKnee, LeftFoot],
            },
            EndEffector::RightFoot => IkChain::TwoBone {
                base: Hip,
                joints: [RightKnee, RightFoot],
            },
            EndEffector::LeftToe => IkChain::Single {
                base: LeftFoot,
                joint: LeftToe,
            },
            EndEffector::RightToe => IkChain::Single {
                base: RightFoot,
                joint: RightToe,
            },
        }
    }
}

#[inline]
pub fn is_end_effector(joint: Joint) -> bool {
    EndEffector::from_joint(joint).is_some()
}

/// Solve with the default clamp margin. See [`solve_ik_for_end_effector_with_epsilon`].
pub fn solve_ik_for_end_effector(
    target: Point,
    effector: EndEffector,
    pose: &Pose,
    skeleton: &Skeleton,
) -> Pose {
    solve_ik_for_end_effector_with_epsilon(target, effector, pose, skeleton, DEFAULT_IK_EPSILON)
}

/// Return a copy of `pose` with only `effector`'s chain re-aimed at `target`.
///
/// If the chain's base has no FK position or a bone length is unknown, the copy is
/// returned unchanged.
pub fn solve_ik_for_end_effector_with_epsilon(
    target: Point,
    effector: EndEffector,
    pose: &Pose,
    skeleton: &Skeleton,
    eps: f64,
) -> Pose {
    let mut solved = pose.clone();
    let chain = effector.chain();
    let points = points_from_pose(pose, skeleton);
    let Some(base_pos) = points.get(chain.base()) else {
        log::debug!("ik: base {} of {:?} not placed", chain.base(), effector);
        return solved;
    };

    match chain {
        IkChain::Single { base, joint } => {
            if skeleton.bone_length_between(joint, base).is_some() {
                solved.angles.set(joint, base_pos.angle_to(target));
            }
        }
        IkChain::TwoBone {
            base,
            joints: [j1, j2],
        } => {
            let lengths = (
                skeleton.bone_length_between(j1, base),
                skeleton.bone_length_between(j2, j1),
            );
            if let (Some(l1), Some(l2)) = lengths {
                let [a1, a2] = solve_two_joint_ik_with_epsilon(target, base_pos, l1, l2, eps);
                solved.angles.set(j1, a1);
                solved.angles.set(j2, a2);
            }
        }
    }
    solved
}
