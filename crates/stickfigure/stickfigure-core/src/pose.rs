//! Points, per-joint angle tables and poses.

use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::joint::Joint;

/// 2D point in screen space (+y down).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Absolute angle of the vector `self -> other`.
    #[inline]
    pub fn angle_to(self, other: Point) -> f64 {
        let d = other - self;
        d.y.atan2(d.x)
    }

    /// Point at `length` along `angle` from `self`.
    #[inline]
    pub fn offset(self, angle: f64, length: f64) -> Point {
        Point::new(self.x + angle.cos() * length, self.y + angle.sin() * length)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Absolute angle per joint, indexed by [`Joint`].
///
/// A slot may be empty: freshly imported or hand-built poses can lack joints, and
/// interpolation falls back to the source value for those. The root slot is never
/// filled.
///
/// On the wire this is a `{ "jointName": radians }` object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct JointAngles([Option<f64>; Joint::COUNT]);

impl JointAngles {
    #[inline]
    pub fn get(&self, joint: Joint) -> Option<f64> {
        self.0[joint.index()]
    }

    /// Set an angle. Writes to the root are ignored.
    #[inline]
    pub fn set(&mut self, joint: Joint, angle: f64) {
        if !joint.is_root() {
            self.0[joint.index()] = Some(angle);
        }
    }

    #[inline]
    pub fn remove(&mut self, joint: Joint) -> Option<f64> {
        self.0[joint.index()].take()
    }

    #[inline]
    pub fn contains(&self, joint: Joint) -> bool {
        self.0[joint.index()].is_some()
    }

    /// Present `(joint, angle)` pairs in joint order.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, f64)> + '_ {
        Joint::ALL
            .iter()
            .filter_map(move |j| self.get(*j).map(|a| (*j, a)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|a| a.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BTreeMap<String, f64>> for JointAngles {
    fn from(map: BTreeMap<String, f64>) -> Self {
        let mut angles = JointAngles::default();
        for (name, angle) in map {
            match Joint::from_name(&name) {
                Some(joint) if joint.is_root() => {
                    log::warn!("ignoring angle for '{name}': the root has no angle")
                }
                Some(joint) => angles.set(joint, angle),
                None => log::warn!("ignoring angle for unknown joint '{name}'"),
            }
        }
        angles
    }
}

impl From<JointAngles> for BTreeMap<String, f64> {
    fn from(angles: JointAngles) -> Self {
        angles
            .iter()
            .map(|(j, a)| (j.name().to_string(), a))
            .collect()
    }
}

/// Root position plus absolute joint angles. Cloned by value whenever stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub hip: Point,
    pub angles: JointAngles,
}

impl Pose {
    pub fn new(hip: Point) -> Self {
        Self {
            hip,
            angles: JointAngles::default(),
        }
    }

    /// Builder-style angle assignment.
    pub fn with_angle(mut self, joint: Joint, angle: f64) -> Self {
        self.angles.set(joint, angle);
        self
    }

    #[inline]
    pub fn angle(&self, joint: Joint) -> Option<f64> {
        self.angles.get(joint)
    }

    /// Joints (other than the root) without an angle.
    pub fn missing_joints(&self) -> Vec<Joint> {
        Joint::ALL
            .into_iter()
            .filter(|j| !j.is_root() && !self.angles.contains(*j))
            .collect()
    }

    /// True when every non-root joint has an angle.
    pub fn is_complete(&self) -> bool {
        self.missing_joints().is_empty()
    }

    /// Fill every missing joint with [`Joint::rest_angle`]. Returns how many were filled.
    pub fn fill_missing_with_rest(&mut self) -> usize {
        let missing = self.missing_joints();
        for joint in &missing {
            self.angles.set(*joint, joint.rest_angle());
        }
        missing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_angle_is_never_stored() {
        let mut angles = JointAngles::default();
        angles.set(Joint::Hip, 1.0);
        assert_eq!(angles.get(Joint::Hip), None);
        assert!(angles.is_empty());
    }

    #[test]
    fn angles_serialize_as_named_map() {
        let pose = Pose::new(Point::new(1.0, 2.0))
            .with_angle(Joint::NeckBase, -1.5)
            .with_angle(Joint::LeftToe, 3.0);
        let v = serde_json::to_value(&pose).unwrap();
        assert_eq!(v["hip"]["x"], 1.0);
        assert_eq!(v["angles"]["neckBase"], -1.5);
        assert_eq!(v["angles"]["leftToe"], 3.0);
        assert_eq!(v["angles"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn unknown_angle_keys_are_dropped() {
        let pose: Pose = serde_json::from_str(
            r#"{"hip":{"x":0,"y":0},"angles":{"neck":0.5,"tail":1.0,"hip":2.0}}"#,
        )
        .unwrap();
        assert_eq!(pose.angle(Joint::Neck), Some(0.5));
        assert_eq!(pose.angles.len(), 1);
    }

    #[test]
    fn root_angle_key_is_ignored() {
        let map = BTreeMap::from([("hip".to_string(), 2.0), ("head".to_string(), 0.5)]);
        let angles = JointAngles::from(map);
        assert!(!angles.contains(Joint::Hip));
        assert_eq!(angles.get(Joint::Head), Some(0.5));
        assert_eq!(angles.len(), 1);
    }

    #[test]
    fn fill_missing_uses_rest_angles() {
        let mut pose = Pose::new(Point::default()).with_angle(Joint::Head, 0.25);
        let filled = pose.fill_missing_with_rest();
        assert_eq!(filled, Joint::COUNT - 2);
        assert!(pose.is_complete());
        assert_eq!(pose.angle(Joint::Head), Some(0.25));
        assert_eq!(pose.angle(Joint::RightToe), Some(Joint::RightToe.rest_angle()));
    }

    #[test]
    fn point_helpers() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(4.0, 5.0);
        assert_eq!(a.distance(b), 5.0);
        let c = a.offset(a.angle_to(b), 5.0);
        assert!((c.x - b.x).abs() < 1e-12 && (c.y - b.y).abs() < 1e-12);
    }
}
