//! Playback preview overlays: the motion trail (sampled FK positions across the whole
//! clip) and onion skinning (faded neighbours of the selected keyframe).

use serde::{Deserialize, Serialize};

use crate::interp::pose_at_progress;
use crate::keyframes::Keyframe;
use crate::kinematics::{points_from_pose, JointPoints};
use crate::skeleton::Skeleton;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailSettings {
    pub enabled: bool,
    /// Draw every `resolution`-th frame.
    pub resolution: usize,
    pub fps: f64,
}

impl Default for TrailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            resolution: 1,
            fps: 60.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrailFrame {
    pub progress: f64,
    pub points: JointPoints,
}

/// Pre-sampled joint positions drawn behind the figure during playback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionTrail {
    pub frames: Vec<TrailFrame>,
    /// Per-frame opacity, `clamp(15 / frames, 0.01, 0.25)`.
    pub opacity: f64,
}

impl MotionTrail {
    /// Sample the clip at `fps` and keep every `resolution`-th frame.
    /// `None` when the clip is too short to produce two frames or nothing was drawn.
    pub fn build(
        keyframes: &[Keyframe],
        duration_ms: f64,
        skeleton: &Skeleton,
        settings: &TrailSettings,
    ) -> Option<MotionTrail> {
        if keyframes.is_empty() || !(duration_ms.is_finite() && settings.fps.is_finite()) {
            return None;
        }
        let total = (duration_ms / 1000.0 * settings.fps).floor();
        if !(total >= 2.0) {
            return None;
        }
        let total = total as usize;
        let step = settings.resolution.max(1);
        let frames_to_draw = total / step;
        if frames_to_draw == 0 {
            return None;
        }
        let opacity = (15.0 / frames_to_draw as f64).clamp(0.01, 0.25);

        let last = (total - 1) as f64;
        let frames: Vec<TrailFrame> = (0..total)
            .step_by(step)
            .filter_map(|i| {
                let progress = i as f64 / last;
                pose_at_progress(progress, keyframes).map(|pose| TrailFrame {
                    progress,
                    points: points_from_pose(&pose, skeleton),
                })
            })
            .collect();

        if frames.is_empty() {
            None
        } else {
            Some(MotionTrail { frames, opacity })
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnionSide {
    Before,
    After,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OnionFrame {
    pub index: usize,
    pub opacity: f64,
    pub side: OnionSide,
}

/// Neighbours of `active` (out of `count` keyframes) with `opacity = base / distance`.
/// Frames at or below 0.05 opacity are dropped. Nearest first on each side.
pub fn onion_skin(
    active: usize,
    count: usize,
    before: usize,
    after: usize,
    base_opacity: f64,
) -> Vec<OnionFrame> {
    let mut out = Vec::new();
    if active >= count {
        return out;
    }
    let visible = |distance: usize| {
        let opacity = base_opacity / distance as f64;
        (opacity > 0.05).then_some(opacity)
    };

    for distance in 1..=before.min(active) {
        if let Some(opacity) = visible(distance) {
            out.push(OnionFrame {
                index: active - distance,
                opacity,
                side: OnionSide::Before,
            });
        }
    }
    for distance in 1..=after.min(count - 1 - active) {
        if let Some(opacity) = visible(distance) {
            out.push(OnionFrame {
                index: active + distance,
                opacity,
                side: OnionSide::After,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Point;

    fn clip() -> (Skeleton, Vec<Keyframe>) {
        let sk = Skeleton::standard(800.0, 450.0);
        let a = sk.default_pose().clone();
        let mut b = a.clone();
        b.hip = b.hip + Point::new(100.0, 0.0);
        (sk, vec![Keyframe::new(a, 0.0), Keyframe::new(b, 1.0)])
    }

    #[test]
    fn opacity_formula_and_frame_count() {
        let (sk, kfs) = clip();
        let settings = TrailSettings {
            enabled: true,
            resolution: 2,
            fps: 60.0,
        };
        // 1000ms at 60fps: 60 frames, 30 drawn.
        let trail = MotionTrail::build(&kfs, 1000.0, &sk, &settings).unwrap();
        assert_eq!(trail.len(), 30);
        assert!((trail.opacity - 0.25).abs() < 1e-12);

        let trail = MotionTrail::build(&kfs, 5000.0, &sk, &TrailSettings::default()).unwrap();
        assert_eq!(trail.len(), 300);
        assert!((trail.opacity - 0.05).abs() < 1e-12);
        assert_eq!(trail.frames[0].progress, 0.0);
        assert_eq!(trail.frames[299].progress, 1.0);
    }

    #[test]
    fn too_short_clip_has_no_trail() {
        let (sk, kfs) = clip();
        assert!(MotionTrail::build(&kfs, 20.0, &sk, &TrailSettings::default()).is_none());
        let coarse = TrailSettings {
            resolution: 10,
            ..TrailSettings::default()
        };
        // 6 frames, step 10 -> nothing to draw.
        assert!(MotionTrail::build(&kfs, 100.0, &sk, &coarse).is_none());
    }

    #[test]
    fn onion_skin_fades_and_drops() {
        let frames = onion_skin(5, 20, 10, 10, 0.4);
        // 0.4/d > 0.05 only for d <= 7.
        let before: Vec<_> = frames
            .iter()
            .filter(|f| f.side == OnionSide::Before)
            .collect();
        assert_eq!(before.len(), 5);
        assert_eq!(before[0].index, 4);
        assert!((before[0].opacity - 0.4).abs() < 1e-12);
        let after: Vec<_> = frames
            .iter()
            .filter(|f| f.side == OnionSide::After)
            .collect();
        assert_eq!(after.len(), 7);
        assert_eq!(after.last().unwrap().index, 12);
    }

    #[test]
    fn onion_skin_at_edges() {
        assert!(onion_skin(0, 1, 5, 5, 0.4).is_empty());
        assert!(onion_skin(3, 2, 5, 5, 0.4).is_empty());
        let f = onion_skin(0, 3, 5, 5, 0.4);
        assert_eq!(f.len(), 2);
        assert!(f.iter().all(|f| f.side == OnionSide::After));
    }
}
