//! Time display and duration entry in seconds or 60 fps frames.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Display rate used for frame counts.
pub const FRAMES_PER_SECOND: f64 = 60.0;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Frames,
}

impl TimeUnit {
    pub fn toggled(self) -> Self {
        match self {
            TimeUnit::Seconds => TimeUnit::Frames,
            TimeUnit::Frames => TimeUnit::Seconds,
        }
    }

    /// Convert a duration entered in this unit to milliseconds.
    pub fn to_ms(self, value: f64) -> f64 {
        match self {
            TimeUnit::Seconds => value * 1000.0,
            TimeUnit::Frames => frames_to_ms(value),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Frames => "frames",
        })
    }
}

impl FromStr for TimeUnit {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seconds" | "s" => Ok(TimeUnit::Seconds),
            "frames" | "f" => Ok(TimeUnit::Frames),
            other => Err(EditorError::InvalidDuration(format!(
                "unknown time unit '{other}'"
            ))),
        }
    }
}

#[inline]
pub fn frames_to_ms(frames: f64) -> f64 {
    frames / FRAMES_PER_SECOND * 1000.0
}

/// Nearest whole frame.
#[inline]
pub fn ms_to_frames(ms: f64) -> f64 {
    (ms / 1000.0 * FRAMES_PER_SECOND).round()
}

/// Label for a normalized time: `"1.5s"` (one decimal) or `"90f"` (rounded frame).
pub fn format_time(progress: f64, unit: TimeUnit, duration_ms: f64) -> String {
    let ms = progress * duration_ms;
    match unit {
        TimeUnit::Seconds => format!("{:.1}s", ms / 1000.0),
        TimeUnit::Frames => format!("{}f", ms_to_frames(ms)),
    }
}

/// Parse a duration field. Seconds accept any positive number, frames a positive
/// integer. Returns the value in the given unit.
pub fn parse_duration(text: &str, unit: TimeUnit) -> Result<f64> {
    let text = text.trim();
    let value = match unit {
        TimeUnit::Seconds => text.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0),
        TimeUnit::Frames => text.parse::<u64>().ok().filter(|v| *v > 0).map(|v| v as f64),
    };
    value.ok_or_else(|| {
        let expected = match unit {
            TimeUnit::Seconds => "a positive number",
            TimeUnit::Frames => "a positive integer",
        };
        EditorError::InvalidDuration(format!("'{text}' is not {expected} of {unit}"))
    })
}
