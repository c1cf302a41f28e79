//! Playback state machine and frame scheduling.
//!
//! `Stopped -> Playing <-> Paused -> Stopped`. Timing is delta-based: every
//! transition takes the caller's monotonic timestamp (ms), so irregular frame
//! intervals are fine and tests drive time explicitly.

use serde::{Deserialize, Serialize};

/// Handle for a scheduled frame callback.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

/// The host's "call me on the next frame" primitive.
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameId;
    /// Cancelling an already-fired or unknown id is a no-op.
    fn cancel_frame(&mut self, id: FrameId);
}

/// Host that only records the outstanding request. The embedder polls
/// [`ManualFrameHost::pending`] and calls back with its own clock.
#[derive(Clone, Debug, Default)]
pub struct ManualFrameHost {
    next: u64,
    pending: Option<FrameId>,
}

impl ManualFrameHost {
    pub fn pending(&self) -> Option<FrameId> {
        self.pending
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self) -> FrameId {
        self.next += 1;
        let id = FrameId(self.next);
        self.pending = Some(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// What happens when the clock runs past the end of the clip.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackMode {
    /// Wrap back to the start.
    #[default]
    Loop,
    /// Play forward, then backward.
    PingPong,
}

impl PlaybackMode {
    pub fn toggled(self) -> Self {
        match self {
            PlaybackMode::Loop => PlaybackMode::PingPong,
            PlaybackMode::PingPong => PlaybackMode::Loop,
        }
    }
}

/// Floating modulo with the sign of `b`.
fn fmod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Normalized progress for `elapsed_ms` of wall time.
///
/// Loop wraps every `duration_ms`. PingPong runs a `2 * duration_ms` cycle and
/// mirrors its second half, so `1.5 * duration` maps to the same progress as
/// `0.5 * duration`.
pub fn cycle_progress(elapsed_ms: f64, duration_ms: f64, mode: PlaybackMode) -> f64 {
    if !(duration_ms > 0.0) || !elapsed_ms.is_finite() {
        return 0.0;
    }
    match mode {
        PlaybackMode::Loop => fmod(elapsed_ms, duration_ms) / duration_ms,
        PlaybackMode::PingPong => {
            let p = fmod(elapsed_ms, 2.0 * duration_ms) / duration_ms;
            if p > 1.0 {
                2.0 - p
            } else {
                p
            }
        }
    }
}

/// Clock and transport state. Pose and selection side effects belong to the
/// session; this type only tracks time and the frame request.
#[derive(Clone, Debug, Default)]
pub struct Playback {
    state: PlaybackState,
    mode: PlaybackMode,
    progress: f64,
    start_ms: f64,
    elapsed_before_pause_ms: f64,
    restore_index: Option<usize>,
    pending: Option<FrameId>,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state != PlaybackState::Stopped
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    #[inline]
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    #[inline]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Scrub / selection driven progress, clamped to [0,1].
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    #[inline]
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending
    }

    /// Begin (or restart) playback at `now_ms`, remembering which keyframe to
    /// reselect on stop. A restart keeps the index captured by the first start.
    pub fn start(&mut self, now_ms: f64, restore_index: Option<usize>, host: &mut dyn FrameHost) {
        self.cancel_pending(host);
        if self.state == PlaybackState::Stopped {
            self.restore_index = restore_index;
        }
        self.state = PlaybackState::Playing;
        self.start_ms = now_ms;
        self.elapsed_before_pause_ms = 0.0;
        self.pending = Some(host.request_frame());
        log::debug!("playback started at {now_ms}ms");
    }

    /// Advance the clock to `timestamp_ms` and schedule the next frame.
    /// Returns the new progress, or `None` when not playing.
    pub fn advance(
        &mut self,
        timestamp_ms: f64,
        duration_ms: f64,
        host: &mut dyn FrameHost,
    ) -> Option<f64> {
        if self.state != PlaybackState::Playing {
            log::debug!("frame ignored in {:?}", self.state);
            return None;
        }
        self.progress = cycle_progress(timestamp_ms - self.start_ms, duration_ms, self.mode);
        self.pending = Some(host.request_frame());
        Some(self.progress)
    }

    pub fn pause(&mut self, now_ms: f64, host: &mut dyn FrameHost) -> bool {
        if self.state != PlaybackState::Playing {
            log::debug!("pause ignored in {:?}", self.state);
            return false;
        }
        self.elapsed_before_pause_ms = now_ms - self.start_ms;
        self.cancel_pending(host);
        self.state = PlaybackState::Paused;
        true
    }

    pub fn resume(&mut self, now_ms: f64, host: &mut dyn FrameHost) -> bool {
        if self.state != PlaybackState::Paused {
            log::debug!("resume ignored in {:?}", self.state);
            return false;
        }
        self.start_ms = now_ms - self.elapsed_before_pause_ms;
        self.state = PlaybackState::Playing;
        self.pending = Some(host.request_frame());
        true
    }

    /// Return to Stopped. Yields the keyframe index captured at start, if any.
    pub fn stop(&mut self, host: &mut dyn FrameHost) -> Option<usize> {
        self.cancel_pending(host);
        self.state = PlaybackState::Stopped;
        self.elapsed_before_pause_ms = 0.0;
        self.restore_index.take()
    }

    /// Drop to Stopped after an insert at the paused position. Progress is kept
    /// and no keyframe is restored.
    pub fn settle(&mut self, host: &mut dyn FrameHost) {
        self.cancel_pending(host);
        self.state = PlaybackState::Stopped;
        self.elapsed_before_pause_ms = 0.0;
        self.restore_index = None;
    }

    fn cancel_pending(&mut self, host: &mut dyn FrameHost) {
        if let Some(id) = self.pending.take() {
            host.cancel_frame(id);
        }
    }
}
