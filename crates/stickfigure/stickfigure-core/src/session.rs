//! Editor session: the single owner of skeleton, keyframes, working pose and
//! playback state.
//!
//! Editing operations are silent no-ops while playback runs; they report that by
//! returning `None`/`false` rather than an error. Transport operations follow the
//! playback state machine (see [`crate::playback`]).

use crate::config::EditorConfig;
use crate::document::{self, ExportDocument};
use crate::error::Result;
use crate::ik::{solve_ik_for_end_effector_with_epsilon, EndEffector};
use crate::interp::pose_at_progress;
use crate::joint::Joint;
use crate::keyframes::{Keyframe, KeyframeStore};
use crate::kinematics::{points_from_pose, JointPoints};
use crate::playback::{FrameHost, FrameId, ManualFrameHost, Playback, PlaybackMode, PlaybackState};
use crate::pose::{Point, Pose};
use crate::skeleton::Skeleton;
use crate::timecode::{self, TimeUnit};
use crate::trail::{onion_skin, MotionTrail, OnionFrame, TrailSettings};

/// Progress within this distance of a keyframe counts as sitting on it.
const KEYFRAME_SNAP: f64 = 1e-4;

/// Joints are kept this far above the bottom edge of the posing area while dragged.
const DRAG_FLOOR_MARGIN: f64 = 2.0;

pub struct EditorSession {
    config: EditorConfig,
    skeleton: Skeleton,
    store: KeyframeStore,
    working: Pose,
    playback: Playback,
    host: Box<dyn FrameHost>,
    trail: Option<MotionTrail>,
    time_unit: TimeUnit,
    /// Drags on hands, feet and toes solve IK instead of rotating the bone.
    ik_mode: bool,
    onion_mode: bool,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::build(EditorConfig::default(), Box::<ManualFrameHost>::default())
    }
}

impl EditorSession {
    /// Session with a [`ManualFrameHost`]; poll [`EditorSession::pending_frame`] to
    /// drive frames.
    pub fn new(config: EditorConfig) -> Result<Self> {
        Self::with_frame_host(config, Box::<ManualFrameHost>::default())
    }

    pub fn with_frame_host(config: EditorConfig, host: Box<dyn FrameHost>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, host))
    }

    fn build(config: EditorConfig, host: Box<dyn FrameHost>) -> Self {
        let skeleton = Skeleton::standard(config.canvas_width, config.posing_area_height);
        let working = skeleton.default_pose().clone();
        Self {
            store: KeyframeStore::new(&config),
            skeleton,
            working,
            playback: Playback::new(),
            host,
            trail: None,
            time_unit: TimeUnit::default(),
            ik_mode: false,
            onion_mode: false,
            config,
        }
    }

    // ----- views -----

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn working_pose(&self) -> &Pose {
        &self.working
    }

    /// FK positions of the working pose.
    pub fn joint_points(&self) -> JointPoints {
        points_from_pose(&self.working, &self.skeleton)
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        self.store.keyframes()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.store.active_index()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn is_paused(&self) -> bool {
        self.playback.is_paused()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.playback.mode()
    }

    pub fn progress(&self) -> f64 {
        self.playback.progress()
    }

    pub fn duration_ms(&self) -> f64 {
        self.store.duration_ms()
    }

    pub fn pending_frame(&self) -> Option<FrameId> {
        self.playback.pending_frame()
    }

    pub fn motion_trail(&self) -> Option<&MotionTrail> {
        self.trail.as_ref()
    }

    /// Faded neighbours of the active keyframe. Empty while playing or with no
    /// selection.
    pub fn onion_frames(&self) -> Vec<OnionFrame> {
        match self.store.active_index() {
            Some(active) if self.onion_mode && !self.is_playing() => onion_skin(
                active,
                self.store.len(),
                self.config.onion_before,
                self.config.onion_after,
                self.config.onion_base_opacity,
            ),
            _ => Vec::new(),
        }
    }

    /// Whether [`EditorSession::insert_at_current_progress`] would insert: playback
    /// is paused, or stopped on an interpolated (unselected) position, and no
    /// keyframe already sits at the current progress.
    pub fn can_insert_at_progress(&self) -> bool {
        let scrubbing = self.playback.state() == PlaybackState::Stopped
            && self.store.active_index().is_none()
            && self.store.len() >= 2;
        let progress = self.progress();
        let on_keyframe = self
            .store
            .keyframes()
            .iter()
            .any(|kf| (kf.time - progress).abs() < KEYFRAME_SNAP);
        (self.is_paused() || scrubbing) && !on_keyframe
    }

    pub fn ik_mode(&self) -> bool {
        self.ik_mode
    }

    pub fn onion_mode(&self) -> bool {
        self.onion_mode
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Label for a normalized time in the current unit.
    pub fn format_time(&self, time: f64) -> String {
        timecode::format_time(time, self.time_unit, self.store.duration_ms())
    }

    // ----- keyframe editing -----

    fn editing_locked(&self) -> bool {
        self.playback.state() != PlaybackState::Stopped
    }

    fn show_keyframe(&mut self, index: usize) {
        if let Some(kf) = self.store.get(index) {
            self.working = kf.pose.clone();
            let time = kf.time;
            self.playback.set_progress(time);
        }
    }

    fn show_default_pose(&mut self) {
        self.working = self.skeleton.default_pose().clone();
        self.playback.set_progress(0.0);
    }

    /// Write the working pose into the active keyframe.
    pub fn autosave(&mut self) -> bool {
        self.store.autosave(&self.working)
    }

    /// Save the working pose as a new active keyframe at the current progress.
    pub fn add_keyframe(&mut self) -> Option<usize> {
        if self.editing_locked() {
            return None;
        }
        let index = self.store.add(&self.working, self.playback.progress());
        self.show_keyframe(index);
        Some(index)
    }

    /// Remove a keyframe. Deleting the active one resets the working pose to the
    /// default pose and progress to 0.
    pub fn delete_keyframe(&mut self, index: usize) -> Result<Option<Keyframe>> {
        if self.editing_locked() {
            return Ok(None);
        }
        let deleted = self.store.delete(index, &self.working)?;
        if deleted.was_active {
            self.show_default_pose();
            self.onion_mode = false;
        }
        Ok(Some(deleted.keyframe))
    }

    /// Activate a keyframe and load its pose and time.
    pub fn select_keyframe(&mut self, index: usize) -> Result<bool> {
        if self.editing_locked() {
            return Ok(false);
        }
        // Reselecting the active keyframe must not drop unsaved edits.
        self.autosave();
        self.store.select(index, &self.working)?;
        self.show_keyframe(index);
        Ok(true)
    }

    pub fn deselect_keyframe(&mut self) -> bool {
        if self.editing_locked() {
            return false;
        }
        self.store.deselect(&self.working);
        true
    }

    /// Save `pose` at an explicit normalized time (clamped to `[0, 1]`) and
    /// activate it. A non-finite time is ignored.
    pub fn insert_at_time(&mut self, pose: &Pose, time: f64) -> Option<usize> {
        if self.editing_locked() || !time.is_finite() {
            return None;
        }
        self.store.deselect(&self.working);
        let index = self.store.insert_at_time(pose, time)?;
        self.store.set_active(Some(index));
        self.show_keyframe(index);
        Some(index)
    }

    pub fn redistribute_even(&mut self) -> bool {
        if self.editing_locked() || self.store.is_empty() {
            return false;
        }
        self.store.redistribute_even();
        self.sync_progress_to_active();
        true
    }

    pub fn renormalize(&mut self) -> bool {
        if self.editing_locked() || self.store.is_empty() {
            return false;
        }
        self.store.renormalize();
        self.sync_progress_to_active();
        true
    }

    /// Drag an interior keyframe marker along the timeline. The dragged keyframe
    /// becomes active. Returns its new time.
    pub fn move_marker(&mut self, index: usize, time: f64) -> Result<Option<f64>> {
        if self.editing_locked() {
            return Ok(None);
        }
        self.autosave();
        self.store.select(index, &self.working)?;
        self.show_keyframe(index);
        let moved = self.store.move_marker(index, time)?;
        self.sync_progress_to_active();
        Ok(Some(moved))
    }

    /// Thumbnail drag&drop. Returns the moved keyframe's new index.
    pub fn reorder_keyframe(&mut self, from: usize, drop_index: usize) -> Result<Option<usize>> {
        if self.editing_locked() {
            return Ok(None);
        }
        let index = self.store.reorder(from, drop_index, &self.working)?;
        self.show_keyframe(index);
        Ok(Some(index))
    }

    fn sync_progress_to_active(&mut self) {
        if let Some(time) = self.store.active().map(|kf| kf.time) {
            self.playback.set_progress(time);
        }
    }

    // ----- posing -----

    fn clamp_to_posing_area(&self, pos: Point) -> Point {
        Point::new(
            pos.x,
            pos.y.min(self.config.posing_area_height - DRAG_FLOOR_MARGIN),
        )
    }

    /// FK drag: the root follows `pos`; any other joint is re-aimed from its parent.
    /// Requires an active keyframe.
    pub fn drag_joint(&mut self, joint: Joint, pos: Point) -> bool {
        if self.editing_locked() || self.store.active_index().is_none() {
            return false;
        }
        let pos = self.clamp_to_posing_area(pos);
        let Some(parent) = self.skeleton.parent(joint) else {
            self.working.hip = pos;
            return true;
        };
        let Some(parent_pos) = self.joint_points().get(parent) else {
            return false;
        };
        self.working.angles.set(joint, parent_pos.angle_to(pos));
        true
    }

    /// Drag dispatched on the IK toggle: end effectors go through IK when it is
    /// on, every other case is an FK drag.
    pub fn drag(&mut self, joint: Joint, pos: Point) -> bool {
        match EndEffector::from_joint(joint) {
            Some(effector) if self.ik_mode => self.drag_end_effector(effector, pos),
            _ => self.drag_joint(joint, pos),
        }
    }

    /// IK drag of an end effector. Requires an active keyframe.
    pub fn drag_end_effector(&mut self, effector: EndEffector, target: Point) -> bool {
        if self.editing_locked() || self.store.active_index().is_none() {
            return false;
        }
        let target = self.clamp_to_posing_area(target);
        self.working = solve_ik_for_end_effector_with_epsilon(
            target,
            effector,
            &self.working,
            &self.skeleton,
            self.config.ik_epsilon,
        );
        true
    }

    /// Move the playhead. Deselects the active keyframe (autosaving it) and shows
    /// the interpolated pose. Allowed while stopped or paused.
    pub fn scrub(&mut self, progress: f64) -> bool {
        if self.playback.state() == PlaybackState::Playing {
            return false;
        }
        self.store.deselect(&self.working);
        self.playback.set_progress(progress);
        if let Some(pose) = pose_at_progress(self.playback.progress(), self.store.keyframes()) {
            self.working = pose;
        }
        true
    }

    // ----- transport -----

    /// Start playback from the beginning. Needs at least two keyframes.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.store.len() < 2 {
            log::debug!("start ignored with {} keyframe(s)", self.store.len());
            return false;
        }
        let restore = self.store.active_index();
        self.store.deselect(&self.working);
        self.trail = if self.config.trail.enabled {
            MotionTrail::build(
                self.store.keyframes(),
                self.store.duration_ms(),
                &self.skeleton,
                &self.config.trail,
            )
        } else {
            None
        };
        self.playback.start(now_ms, restore, &mut *self.host);
        true
    }

    /// Per-frame update at `timestamp_ms`.
    pub fn frame(&mut self, timestamp_ms: f64) -> bool {
        let duration = self.store.duration_ms();
        let Some(progress) = self
            .playback
            .advance(timestamp_ms, duration, &mut *self.host)
        else {
            return false;
        };
        if let Some(pose) = pose_at_progress(progress, self.store.keyframes()) {
            self.working = pose;
        }
        true
    }

    pub fn pause(&mut self, now_ms: f64) -> bool {
        self.playback.pause(now_ms, &mut *self.host)
    }

    pub fn resume(&mut self, now_ms: f64) -> bool {
        self.playback.resume(now_ms, &mut *self.host)
    }

    /// Stop playback and reselect the keyframe that was active at start (falling
    /// back to the first keyframe, or the default pose when there are none).
    pub fn stop(&mut self) -> bool {
        if !self.playback.is_playing() {
            return false;
        }
        let restore = self.playback.stop(&mut *self.host);
        self.trail = None;
        let index = restore
            .filter(|i| *i < self.store.len())
            .or_else(|| (!self.store.is_empty()).then_some(0));
        match index {
            Some(i) => {
                self.store.set_active(Some(i));
                self.show_keyframe(i);
            }
            None => self.show_default_pose(),
        }
        true
    }

    /// Play/stop button.
    pub fn toggle_play(&mut self, now_ms: f64) -> bool {
        if self.playback.is_playing() {
            self.stop()
        } else {
            self.start(now_ms)
        }
    }

    /// Pause/resume button.
    pub fn toggle_pause(&mut self, now_ms: f64) -> bool {
        match self.playback.state() {
            PlaybackState::Playing => self.pause(now_ms),
            PlaybackState::Paused => self.resume(now_ms),
            PlaybackState::Stopped => false,
        }
    }

    /// Keep the paused (or scrubbed) pose as a keyframe at the current progress and
    /// drop to Stopped with it selected. The working pose is left as is.
    pub fn insert_at_current_progress(&mut self) -> Option<usize> {
        if !self.can_insert_at_progress() {
            return None;
        }
        let index = self
            .store
            .insert_at_time(&self.working, self.playback.progress())?;
        self.playback.settle(&mut *self.host);
        self.trail = None;
        self.store.set_active(Some(index));
        Some(index)
    }

    pub fn toggle_mode(&mut self) -> bool {
        if self.is_playing() || self.store.len() < 2 {
            return false;
        }
        self.playback.set_mode(self.playback.mode().toggled());
        true
    }

    pub fn toggle_ik_mode(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.ik_mode = !self.ik_mode;
        true
    }

    /// Onion skin needs a selected keyframe to centre on.
    pub fn toggle_onion_mode(&mut self) -> bool {
        if self.is_playing() || self.store.active_index().is_none() {
            return false;
        }
        self.onion_mode = !self.onion_mode;
        true
    }

    pub fn toggle_time_unit(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.time_unit = self.time_unit.toggled();
        true
    }

    /// Set the clip duration from a value in `unit`.
    pub fn set_duration(&mut self, value: f64, unit: TimeUnit) -> Result<()> {
        self.store.set_duration_ms(unit.to_ms(value))?;
        log::debug!("duration set to {}ms", self.store.duration_ms());
        Ok(())
    }

    /// Set the clip duration from user text in the current time unit.
    pub fn set_duration_text(&mut self, text: &str) -> Result<()> {
        let value = timecode::parse_duration(text, self.time_unit)?;
        self.set_duration(value, self.time_unit)
    }

    pub fn set_trail_settings(&mut self, settings: TrailSettings) -> Result<()> {
        let config = EditorConfig {
            trail: settings,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_onion_range(&mut self, before: usize, after: usize) {
        self.config.onion_before = before;
        self.config.onion_after = after;
    }

    // ----- documents -----

    /// Export every keyframe (after autosaving the working pose).
    pub fn export_document(&mut self, exported_at: Option<String>) -> Result<ExportDocument> {
        self.autosave();
        document::export_document(self.store.keyframes(), self.store.duration_ms(), exported_at)
    }

    /// Replace all keyframes from a JSON document and select the first one.
    /// On error nothing changes. Returns the number of keyframes loaded.
    pub fn import_document(&mut self, json: &str) -> Result<Option<usize>> {
        if self.editing_locked() {
            return Ok(None);
        }
        let imported = document::parse_document(json)?;
        self.autosave();
        let count = imported.keyframes.len();
        self.store.replace_all(imported.keyframes, imported.duration_ms);
        self.onion_mode = false;
        if count > 0 {
            self.store.set_active(Some(0));
            self.show_keyframe(0);
        } else {
            self.show_default_pose();
        }
        log::info!("imported {count} keyframe(s) from {:?} document", imported.kind);
        Ok(Some(count))
    }
}
