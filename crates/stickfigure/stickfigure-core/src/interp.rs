//! Pose blending and keyframe sampling (piecewise linear).

use std::f64::consts::{PI, TAU};

use crate::keyframes::Keyframe;
use crate::pose::{Point, Pose};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[inline]
pub fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

/// Shortest-path angle interpolation: when the endpoints are more than half a turn
/// apart, the smaller one is lifted by a full turn before blending. The result is
/// not wrapped back into `(-π, π]`, except that `t <= 0` and `t >= 1` return the
/// endpoints exactly.
#[inline]
pub fn lerp_angle(mut a: f64, mut b: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    let delta = b - a;
    if delta.abs() > PI {
        if delta > 0.0 {
            a += TAU;
        } else {
            b += TAU;
        }
    }
    lerp(a, b, t)
}

/// Blend two poses. Angles are taken from `a`'s key set; a joint missing from `b`
/// keeps `a`'s value.
pub fn interpolate_pose(a: &Pose, b: &Pose, t: f64) -> Pose {
    let mut out = Pose::new(lerp_point(a.hip, b.hip, t));
    for (joint, from) in a.angles.iter() {
        let angle = match b.angle(joint) {
            Some(to) => lerp_angle(from, to, t),
            None => from,
        };
        out.angles.set(joint, angle);
    }
    out
}

/// Pose at normalized `progress` along a time-sorted keyframe list.
///
/// * no keyframes: `None`
/// * one keyframe: a copy of it, whatever `progress` is
/// * otherwise: blend inside the first segment with `t[i] <= progress <= t[i+1]`;
///   a zero-length segment yields its right end. Outside every segment the nearest
///   boundary keyframe is returned unchanged.
pub fn pose_at_progress(progress: f64, keyframes: &[Keyframe]) -> Option<Pose> {
    let (first, last) = match keyframes {
        [] => return None,
        [only] => return Some(only.pose.clone()),
        [first, .., last] => (first, last),
    };

    for pair in keyframes.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        if progress >= from.time && progress <= to.time {
            let span = to.time - from.time;
            let segment_t = if span == 0.0 {
                1.0
            } else {
                ((progress - from.time) / span).min(1.0)
            };
            return Some(interpolate_pose(&from.pose, &to.pose, segment_t));
        }
    }

    if progress > last.time {
        Some(last.pose.clone())
    } else {
        Some(first.pose.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Joint;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.25), 3.0);
    }

    #[test]
    fn lerp_angle_short_way_both_directions() {
        let deg = |d: f64| d.to_radians();
        let up = lerp_angle(deg(170.0), deg(-170.0), 0.5);
        assert!((up.to_degrees().abs() - 180.0).abs() < 1e-9, "{}", up.to_degrees());
        let down = lerp_angle(deg(-170.0), deg(170.0), 0.5);
        assert!((down.to_degrees().abs() - 180.0).abs() < 1e-9);
        let plain = lerp_angle(deg(10.0), deg(50.0), 0.5);
        assert!((plain.to_degrees() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn missing_target_angle_keeps_source() {
        let a = Pose::new(Point::new(0.0, 0.0))
            .with_angle(Joint::Neck, 1.0)
            .with_angle(Joint::Head, 2.0);
        let b = Pose::new(Point::new(10.0, 0.0)).with_angle(Joint::Neck, 0.0);
        let p = interpolate_pose(&a, &b, 0.5);
        assert_eq!(p.hip, Point::new(5.0, 0.0));
        assert_eq!(p.angle(Joint::Neck), Some(0.5));
        assert_eq!(p.angle(Joint::Head), Some(2.0));
    }
}
