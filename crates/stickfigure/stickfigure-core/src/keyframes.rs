//! Keyframe store: an ordered list of timed poses, the clip duration and the active
//! selection.
//!
//! Timing model:
//! - each keyframe carries a normalized time in [0,1]; `time * duration_ms` is its
//!   absolute position;
//! - the list is sorted ascending by time when any method returns;
//! - the active index follows its keyframe across re-sorts and is cleared when that
//!   keyframe is removed.
//!
//! Every operation that reassigns the active keyframe first writes the caller's
//! working pose back into the currently active one (autosave), so edits are never
//! lost on a switch.

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::pose::Pose;

/// A saved pose anchored to a normalized time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub pose: Pose,
    /// Normalized time in [0,1] within the clip duration.
    pub time: f64,
}

impl Keyframe {
    pub fn new(pose: Pose, time: f64) -> Self {
        Self { pose, time }
    }
}

/// Result of [`KeyframeStore::delete`].
#[derive(Clone, Debug, PartialEq)]
pub struct DeletedKeyframe {
    pub keyframe: Keyframe,
    /// The removed keyframe was the active one; the selection is now empty.
    pub was_active: bool,
}

#[derive(Clone, Debug)]
pub struct KeyframeStore {
    keyframes: Vec<Keyframe>,
    duration_ms: f64,
    active: Option<usize>,

    default_duration_ms: f64,
    extension_ms: f64,
    marker_gap: f64,
}

impl Default for KeyframeStore {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl KeyframeStore {
    pub fn new(cfg: &EditorConfig) -> Self {
        Self {
            keyframes: Vec::new(),
            duration_ms: cfg.default_duration_ms,
            active: None,
            default_duration_ms: cfg.default_duration_ms,
            extension_ms: cfg.extension_ms,
            marker_gap: cfg.marker_gap,
        }
    }

    #[inline]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Keyframe> {
        self.keyframes.get(index)
    }

    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    #[inline]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Keyframe> {
        self.active.and_then(|i| self.keyframes.get(i))
    }

    /// Absolute times in milliseconds, in list order.
    pub fn absolute_times_ms(&self) -> Vec<f64> {
        self.keyframes
            .iter()
            .map(|kf| kf.time * self.duration_ms)
            .collect()
    }

    /// Set the clip duration without touching normalized times.
    pub fn set_duration_ms(&mut self, duration_ms: f64) -> Result<()> {
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(EditorError::InvalidDuration(format!(
                "duration must be positive, got {duration_ms}"
            )));
        }
        self.duration_ms = duration_ms;
        Ok(())
    }

    /// Write `working` into the active keyframe. Returns whether anything was saved.
    pub fn autosave(&mut self, working: &Pose) -> bool {
        match self.active.and_then(|i| self.keyframes.get_mut(i)) {
            Some(kf) => {
                kf.pose = working.clone();
                true
            }
            None => false,
        }
    }

    /// Make `index` active, autosaving the previous selection first.
    pub fn select(&mut self, index: usize, working: &Pose) -> Result<&Keyframe> {
        self.check_index(index)?;
        if self.active != Some(index) {
            self.autosave(working);
            self.active = Some(index);
        }
        Ok(&self.keyframes[index])
    }

    /// Clear the selection, autosaving it first.
    pub fn deselect(&mut self, working: &Pose) {
        self.autosave(working);
        self.active = None;
    }

    /// Set the selection directly, without autosave. Out-of-range indices clear it.
    pub fn set_active(&mut self, index: Option<usize>) {
        self.active = index.filter(|i| *i < self.keyframes.len());
    }

    /// Save `working` as a new keyframe and make it active. Returns its index.
    ///
    /// The first keyframe lands at 0 and the second at 1; later ones land at
    /// `progress`. If a keyframe already sits at exactly that time the new one goes
    /// halfway to the next keyframe, or to the end when there is none. Landing at or
    /// past the end of a non-empty clip extends the duration by the configured
    /// increment, rescales existing times so their absolute positions hold, and pins
    /// the new keyframe at 1.
    pub fn add(&mut self, working: &Pose, progress: f64) -> usize {
        self.autosave(working);

        let progress = if progress.is_finite() {
            progress.max(0.0)
        } else {
            0.0
        };
        let mut time = match self.keyframes.len() {
            0 => 0.0,
            1 => 1.0,
            _ => progress,
        };

        self.sort_by_time();

        if let Some(existing) = self.keyframes.iter().position(|kf| kf.time == time) {
            time = match self.keyframes.get(existing + 1) {
                Some(next) => time + (next.time - time) / 2.0,
                None => 1.0,
            };
        }

        if !self.keyframes.is_empty() && time >= 1.0 {
            let old = self.duration_ms;
            let new = old + self.extension_ms;
            self.duration_ms = new;
            if new > 0.0 {
                for kf in &mut self.keyframes {
                    kf.time = kf.time * old / new;
                }
            }
            time = 1.0;
            log::debug!("clip extended {old}ms -> {new}ms");
        }

        self.keyframes.push(Keyframe::new(working.clone(), time));
        let pushed = self.keyframes.len() - 1;
        let order = self.sort_by_time();
        let index = new_position(&order, pushed).unwrap_or(pushed);
        self.active = Some(index);
        index
    }

    /// Remove the keyframe at `index`, autosaving the working pose first.
    ///
    /// - nothing left: duration resets to the default;
    /// - one left: its time becomes 0;
    /// - the chronologically last was removed: the clip shrinks to end at the new
    ///   last keyframe, which lands exactly at 1 with relative spacing preserved;
    /// - a middle keyframe was removed: surviving times are untouched.
    pub fn delete(&mut self, index: usize, working: &Pose) -> Result<DeletedKeyframe> {
        self.check_index(index)?;
        self.autosave(working);

        let was_last = index == self.keyframes.len() - 1;
        let old = self.duration_ms;
        let was_active = self.active == Some(index);
        if was_active {
            self.active = None;
        }

        let keyframe = self.keyframes.remove(index);
        if let Some(a) = self.active {
            if a > index {
                self.active = Some(a - 1);
            }
        }

        match self.keyframes.len() {
            0 => self.duration_ms = self.default_duration_ms,
            1 => self.keyframes[0].time = 0.0,
            n if was_last => {
                let new = self.keyframes[n - 1].time * old;
                if new > 0.0 && old > 0.0 {
                    self.duration_ms = new;
                    for kf in &mut self.keyframes {
                        kf.time = kf.time * old / new;
                    }
                    self.keyframes[n - 1].time = 1.0;
                    log::debug!("clip shrunk {old}ms -> {new}ms");
                } else {
                    for kf in &mut self.keyframes {
                        kf.time = 0.0;
                    }
                }
            }
            _ => {}
        }

        Ok(DeletedKeyframe {
            keyframe,
            was_active,
        })
    }

    /// Insert a copy of `pose` at a normalized `time`, clamped to `[0, 1]`. No
    /// renormalization. The selection is not changed (only re-mapped). Returns the
    /// new index, or `None` for a non-finite time.
    pub fn insert_at_time(&mut self, pose: &Pose, time: f64) -> Option<usize> {
        if !time.is_finite() {
            log::debug!("insert ignored at non-finite time {time}");
            return None;
        }
        let time = time.clamp(0.0, 1.0);
        self.keyframes.push(Keyframe::new(pose.clone(), time));
        let pushed = self.keyframes.len() - 1;
        let order = self.sort_by_time();
        Some(new_position(&order, pushed).unwrap_or(pushed))
    }

    /// Uniform spacing: `time[i] = i / (n - 1)`; a lone keyframe sits at 0.
    pub fn redistribute_even(&mut self) {
        let n = self.keyframes.len();
        if n == 1 {
            self.keyframes[0].time = 0.0;
            return;
        }
        for (i, kf) in self.keyframes.iter_mut().enumerate() {
            kf.time = i as f64 / (n - 1) as f64;
        }
    }

    /// Linearly map `[first, last]` onto `[0, 1]`. Identical times are spread evenly.
    pub fn renormalize(&mut self) {
        self.sort_by_time();
        let n = self.keyframes.len();
        if n < 2 {
            if n == 1 {
                self.keyframes[0].time = 0.0;
            }
            return;
        }
        let first = self.keyframes[0].time;
        let span = self.keyframes[n - 1].time - first;
        if span == 0.0 {
            self.redistribute_even();
            return;
        }
        for kf in &mut self.keyframes {
            kf.time = (kf.time - first) / span;
        }
        self.keyframes[0].time = 0.0;
        self.keyframes[n - 1].time = 1.0;
    }

    /// Drag a keyframe marker along the timeline. Only interior keyframes move; the
    /// new time is clamped to [0,1] and kept `marker_gap` away from both neighbours.
    /// A non-finite time leaves the marker in place. Returns the keyframe's time
    /// after the move.
    pub fn move_marker(&mut self, index: usize, time: f64) -> Result<f64> {
        self.check_index(index)?;
        let n = self.keyframes.len();
        if index == 0 || index == n - 1 || !time.is_finite() {
            return Ok(self.keyframes[index].time);
        }
        let prev = self.keyframes[index - 1].time;
        let next = self.keyframes[index + 1].time;
        let constrained = time
            .clamp(0.0, 1.0)
            .max(prev + self.marker_gap)
            .min(next - self.marker_gap)
            .clamp(prev, next);
        self.keyframes[index].time = constrained;
        self.sort_by_time();
        Ok(constrained)
    }

    /// Thumbnail drag&drop. The keyframe at `from` trades times with the keyframe
    /// occupying its drop slot, the list is re-sorted, and if the last keyframe no
    /// longer sits at 1 the clip is rescaled so it does. The moved keyframe becomes
    /// active. Returns its new index.
    pub fn reorder(&mut self, from: usize, drop_index: usize, working: &Pose) -> Result<usize> {
        self.check_index(from)?;
        self.check_index(drop_index)?;
        if from == drop_index {
            return Ok(from);
        }
        self.autosave(working);

        let mut dragged = self.keyframes.remove(from);
        let target = if drop_index > from {
            drop_index - 1
        } else {
            drop_index
        };
        std::mem::swap(&mut dragged.time, &mut self.keyframes[target].time);
        self.keyframes.insert(target, dragged);

        self.active = Some(target);
        self.sort_by_time();

        let n = self.keyframes.len();
        let last = self.keyframes[n - 1].time;
        if last != 1.0 && last > 0.0 {
            self.duration_ms *= last;
            for kf in &mut self.keyframes {
                kf.time /= last;
            }
            self.keyframes[n - 1].time = 1.0;
        }
        Ok(self.active.unwrap_or(target))
    }

    /// Replace the whole list (document import). Times are sorted, the selection is
    /// cleared, and `duration_ms` is applied when positive.
    pub fn replace_all(&mut self, keyframes: Vec<Keyframe>, duration_ms: Option<f64>) {
        self.keyframes = keyframes;
        self.active = None;
        self.sort_by_time();
        if let Some(d) = duration_ms.filter(|d| d.is_finite() && *d > 0.0) {
            self.duration_ms = d;
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.keyframes.len() {
            Ok(())
        } else {
            Err(EditorError::KeyframeOutOfRange {
                index,
                len: self.keyframes.len(),
            })
        }
    }

    /// Stable sort by time. Re-maps the active index and returns the permutation
    /// (`order[new] == old`).
    fn sort_by_time(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.keyframes.len()).collect();
        order.sort_by(|&a, &b| self.keyframes[a].time.total_cmp(&self.keyframes[b].time));
        if order.iter().enumerate().all(|(new, old)| new == *old) {
            return order;
        }

        let mut slots: Vec<Option<Keyframe>> = std::mem::take(&mut self.keyframes)
            .into_iter()
            .map(Some)
            .collect();
        self.keyframes = order.iter().filter_map(|&old| slots[old].take()).collect();
        self.active = self.active.and_then(|a| new_position(&order, a));
        order
    }
}

fn new_position(order: &[usize], old: usize) -> Option<usize> {
    order.iter().position(|&o| o == old)
}
