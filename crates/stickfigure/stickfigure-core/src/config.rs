//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::ik::DEFAULT_IK_EPSILON;
use crate::trail::TrailSettings;

/// Sizing, timing and preview settings for an editor session.
/// Every field has a default, so partial JSON objects are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Posing canvas size; the reference figure is centred in it.
    pub canvas_width: f64,
    pub posing_area_height: f64,

    /// Clip duration for a fresh or emptied store.
    pub default_duration_ms: f64,
    /// Added to the clip when a keyframe is appended past the end.
    pub extension_ms: f64,

    /// Distance clamp margin for the two-bone IK solve.
    pub ik_epsilon: f64,

    /// Minimum normalized gap kept between a dragged marker and its neighbours.
    pub marker_gap: f64,

    pub trail: TrailSettings,

    /// Onion-skin neighbours drawn before/after the active keyframe.
    pub onion_before: usize,
    pub onion_after: usize,
    pub onion_base_opacity: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            posing_area_height: 450.0,
            default_duration_ms: 5000.0,
            extension_ms: 1000.0,
            ik_epsilon: DEFAULT_IK_EPSILON,
            marker_gap: 0.01,
            trail: TrailSettings::default(),
            onion_before: 5,
            onion_after: 5,
            onion_base_opacity: 0.4,
        }
    }
}

impl EditorConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("canvas_width", self.canvas_width),
            ("posing_area_height", self.posing_area_height),
            ("default_duration_ms", self.default_duration_ms),
            ("ik_epsilon", self.ik_epsilon),
            ("trail.fps", self.trail.fps),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EditorError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(self.extension_ms.is_finite() && self.extension_ms >= 0.0) {
            return Err(EditorError::InvalidConfig(format!(
                "extension_ms must be >= 0, got {}",
                self.extension_ms
            )));
        }
        if !(0.0..0.5).contains(&self.marker_gap) {
            return Err(EditorError::InvalidConfig(format!(
                "marker_gap must be in [0, 0.5), got {}",
                self.marker_gap
            )));
        }
        if self.trail.resolution == 0 {
            return Err(EditorError::InvalidConfig(
                "trail.resolution must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
