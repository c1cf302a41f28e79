//! Fixed joint hierarchy with bone lengths and a precomputed traversal order.

use std::collections::VecDeque;

use crate::joint::Joint;
use crate::kinematics::{pose_from_points, JointPoints};
use crate::pose::{Point, Pose};

/// Reference offsets of each joint from the centre of the posing area.
const REFERENCE_OFFSETS: [(Joint, f64, f64); Joint::COUNT] = [
    (Joint::Hip, 0.0, 20.0),
    (Joint::NeckBase, 0.0, -40.0),
    (Joint::Neck, 0.0, -60.0),
    (Joint::Head, 0.0, -80.0),
    (Joint::LeftElbow, -30.0, -20.0),
    (Joint::LeftHand, -60.0, 10.0),
    (Joint::RightElbow, 30.0, -20.0),
    (Joint::RightHand, 60.0, 10.0),
    (Joint::LeftKnee, -20.0, 65.0),
    (Joint::LeftFoot, -30.0, 110.0),
    (Joint::LeftToe, -50.0, 110.0),
    (Joint::RightKnee, 20.0, 65.0),
    (Joint::RightFoot, 30.0, 110.0),
    (Joint::RightToe, 50.0, 110.0),
];

/// Immutable skeleton: parent/children tables, bone lengths keyed by child joint
/// (each child has exactly one parent, so the child identifies the bone), the
/// parent-before-child traversal order, and the default pose derived from the
/// reference points.
#[derive(Clone, Debug)]
pub struct Skeleton {
    parents: [Option<Joint>; Joint::COUNT],
    children: Vec<Vec<Joint>>,
    bone_lengths: [Option<f64>; Joint::COUNT],
    order: Vec<Joint>,
    default_pose: Pose,
}

impl Skeleton {
    /// Build from reference joint positions. Bones whose endpoints are missing get no
    /// length, so FK omits everything below them.
    pub fn from_reference(points: &JointPoints) -> Self {
        let mut parents = [None; Joint::COUNT];
        let mut children: Vec<Vec<Joint>> = vec![Vec::new(); Joint::COUNT];
        let mut bone_lengths = [None; Joint::COUNT];

        for joint in Joint::ALL {
            let Some(parent) = joint.parent() else {
                continue;
            };
            parents[joint.index()] = Some(parent);
            children[parent.index()].push(joint);
            if let (Some(c), Some(p)) = (points.get(joint), points.get(parent)) {
                bone_lengths[joint.index()] = Some(c.distance(p));
            }
        }

        let order = traversal_order(&children);
        let mut skeleton = Skeleton {
            parents,
            children,
            bone_lengths,
            order,
            default_pose: Pose::default(),
        };
        skeleton.default_pose = pose_from_points(points, &skeleton);
        skeleton
    }

    /// The reference stick figure centred in a posing area of the given size.
    pub fn standard(canvas_width: f64, posing_area_height: f64) -> Self {
        Self::from_reference(&Self::reference_points(canvas_width, posing_area_height))
    }

    /// Reference joint positions used by [`Skeleton::standard`].
    pub fn reference_points(canvas_width: f64, posing_area_height: f64) -> JointPoints {
        let centre = Point::new(canvas_width / 2.0, posing_area_height / 2.0);
        let mut points = JointPoints::default();
        for (joint, dx, dy) in REFERENCE_OFFSETS {
            points.set(joint, centre + Point::new(dx, dy));
        }
        points
    }

    #[inline]
    pub fn parent(&self, joint: Joint) -> Option<Joint> {
        self.parents[joint.index()]
    }

    #[inline]
    pub fn children(&self, joint: Joint) -> &[Joint] {
        &self.children[joint.index()]
    }

    /// Length of the bone ending at `child`.
    #[inline]
    pub fn bone_length(&self, child: Joint) -> Option<f64> {
        self.bone_lengths[child.index()]
    }

    /// Length of the bone `(child, parent)`; `None` if `parent` is not `child`'s parent.
    pub fn bone_length_between(&self, child: Joint, parent: Joint) -> Option<f64> {
        if self.parent(child) == Some(parent) {
            self.bone_length(child)
        } else {
            None
        }
    }

    /// Parent-before-child order, root first.
    #[inline]
    pub fn order(&self) -> &[Joint] {
        &self.order
    }

    /// Pose derived from the reference points at construction.
    #[inline]
    pub fn default_pose(&self) -> &Pose {
        &self.default_pose
    }
}

/// Breadth-first order from the root over the children table. Joints unreachable
/// from the root are left out, so a malformed table can never loop.
fn traversal_order(children: &[Vec<Joint>]) -> Vec<Joint> {
    let mut order = Vec::with_capacity(Joint::COUNT);
    let mut seen = [false; Joint::COUNT];
    let mut queue = VecDeque::from([Joint::Hip]);
    seen[Joint::Hip.index()] = true;
    while let Some(joint) = queue.pop_front() {
        order.push(joint);
        for child in &children[joint.index()] {
            if !seen[child.index()] {
                seen[child.index()] = true;
                queue.push_back(*child);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_parent_before_child() {
        let sk = Skeleton::standard(800.0, 450.0);
        assert_eq!(sk.order().len(), Joint::COUNT);
        assert_eq!(sk.order()[0], Joint::Hip);
        for (pos, joint) in sk.order().iter().enumerate() {
            if let Some(parent) = sk.parent(*joint) {
                let ppos = sk.order().iter().position(|j| *j == parent).unwrap();
                assert!(ppos < pos, "{parent} must precede {joint}");
            }
        }
    }

    #[test]
    fn bone_lengths_match_reference_distances() {
        let sk = Skeleton::standard(800.0, 450.0);
        assert!((sk.bone_length(Joint::NeckBase).unwrap() - 60.0).abs() < 1e-9);
        assert!((sk.bone_length(Joint::Head).unwrap() - 20.0).abs() < 1e-9);
        assert!((sk.bone_length(Joint::LeftToe).unwrap() - 20.0).abs() < 1e-9);
        let upper_arm = (30.0f64 * 30.0 + 20.0 * 20.0).sqrt();
        assert!((sk.bone_length(Joint::RightElbow).unwrap() - upper_arm).abs() < 1e-9);
        assert_eq!(sk.bone_length(Joint::Hip), None);
        assert_eq!(sk.bone_length_between(Joint::LeftHand, Joint::Neck), None);
    }

    #[test]
    fn default_pose_matches_rest_angles() {
        let sk = Skeleton::standard(800.0, 450.0);
        let pose = sk.default_pose();
        assert_eq!(pose.hip, Point::new(400.0, 245.0));
        assert!(pose.is_complete());
        for joint in Joint::ALL.into_iter().filter(|j| !j.is_root()) {
            let a = pose.angle(joint).unwrap();
            assert!((a - joint.rest_angle()).abs() < 1e-9, "{joint}: {a}");
        }
    }

    #[test]
    fn missing_reference_point_drops_bone() {
        let mut points = Skeleton::reference_points(100.0, 100.0);
        points.remove(Joint::LeftKnee);
        let sk = Skeleton::from_reference(&points);
        assert_eq!(sk.bone_length(Joint::LeftKnee), None);
        assert_eq!(sk.bone_length(Joint::LeftFoot), None);
        assert!(sk.bone_length(Joint::LeftToe).is_some());
        assert_eq!(sk.default_pose().angle(Joint::LeftKnee), None);
    }
}
