//! Forward kinematics: pose angles -> joint positions, and the inverse derivation of a
//! pose from reference points.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::joint::Joint;
use crate::pose::{Point, Pose};
use crate::skeleton::Skeleton;

/// Joint positions indexed by [`Joint`]. Serialized as `{ "jointName": {x, y} }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Point>", into = "BTreeMap<String, Point>")]
pub struct JointPoints([Option<Point>; Joint::COUNT]);

impl JointPoints {
    #[inline]
    pub fn get(&self, joint: Joint) -> Option<Point> {
        self.0[joint.index()]
    }

    #[inline]
    pub fn set(&mut self, joint: Joint, point: Point) {
        self.0[joint.index()] = Some(point);
    }

    #[inline]
    pub fn remove(&mut self, joint: Joint) -> Option<Point> {
        self.0[joint.index()].take()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, Point)> + '_ {
        Joint::ALL
            .iter()
            .filter_map(move |j| self.get(*j).map(|p| (*j, p)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BTreeMap<String, Point>> for JointPoints {
    fn from(map: BTreeMap<String, Point>) -> Self {
        let mut points = JointPoints::default();
        for (name, p) in map {
            if let Some(joint) = Joint::from_name(&name) {
                points.set(joint, p);
            }
        }
        points
    }
}

impl From<JointPoints> for BTreeMap<String, Point> {
    fn from(points: JointPoints) -> Self {
        points
            .iter()
            .map(|(j, p)| (j.name().to_string(), p))
            .collect()
    }
}

/// Place the root at `pose.hip`, then walk the skeleton's precomputed order placing
/// each child at `parent + (cos θ, sin θ) * length`.
///
/// A joint with no angle, no bone length or no placed parent is omitted, along with
/// its whole subtree.
pub fn points_from_pose(pose: &Pose, skeleton: &Skeleton) -> JointPoints {
    let mut points = JointPoints::default();
    points.set(Joint::Hip, pose.hip);
    for &joint in skeleton.order() {
        let Some(parent) = skeleton.parent(joint) else {
            continue;
        };
        let (Some(parent_pos), Some(angle), Some(length)) = (
            points.get(parent),
            pose.angle(joint),
            skeleton.bone_length(joint),
        ) else {
            continue;
        };
        points.set(joint, parent_pos.offset(angle, length));
    }
    points
}

/// Angle of every hierarchy edge, `atan2(child - parent)`. Edges with a missing
/// endpoint are skipped. Used once at startup to derive the default pose.
pub fn pose_from_points(points: &JointPoints, skeleton: &Skeleton) -> Pose {
    let mut pose = Pose::new(points.get(Joint::Hip).unwrap_or_default());
    for &joint in skeleton.order() {
        let Some(parent) = skeleton.parent(joint) else {
            continue;
        };
        if let (Some(c), Some(p)) = (points.get(joint), points.get(parent)) {
            pose.angles.set(joint, p.angle_to(c));
        }
    }
    pose
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn default_pose_reproduces_reference_points() {
        let sk = Skeleton::standard(800.0, 450.0);
        let reference = Skeleton::reference_points(800.0, 450.0);
        let points = points_from_pose(sk.default_pose(), &sk);
        assert_eq!(points.len(), Joint::COUNT);
        for (joint, p) in reference.iter() {
            assert!(close(points.get(joint).unwrap(), p), "{joint}");
        }
    }

    #[test]
    fn missing_angle_omits_subtree() {
        let sk = Skeleton::standard(800.0, 450.0);
        let mut pose = sk.default_pose().clone();
        pose.angles.remove(Joint::RightKnee);
        let points = points_from_pose(&pose, &sk);
        assert!(points.get(Joint::RightKnee).is_none());
        assert!(points.get(Joint::RightFoot).is_none());
        assert!(points.get(Joint::RightToe).is_none());
        assert!(points.get(Joint::LeftToe).is_some());
    }

    #[test]
    fn moving_hip_translates_every_joint() {
        let sk = Skeleton::standard(800.0, 450.0);
        let base = points_from_pose(sk.default_pose(), &sk);
        let mut pose = sk.default_pose().clone();
        pose.hip = pose.hip + Point::new(10.0, -5.0);
        let moved = points_from_pose(&pose, &sk);
        for (joint, p) in base.iter() {
            assert!(close(moved.get(joint).unwrap(), p + Point::new(10.0, -5.0)));
        }
    }

    #[test]
    fn points_serialize_by_joint_name() {
        let mut points = JointPoints::default();
        points.set(Joint::Head, Point::new(1.0, 2.0));
        let v = serde_json::to_value(&points).unwrap();
        assert_eq!(v["head"]["y"], 2.0);
        let back: JointPoints = serde_json::from_value(v).unwrap();
        assert_eq!(back, points);
    }
}
