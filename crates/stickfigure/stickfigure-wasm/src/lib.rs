use js_sys::JSON;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use stickfigure_core::{
    EditorConfig, EditorError, EditorSession, Joint, Point, Pose, TimeUnit, TrailSettings,
};

#[wasm_bindgen]
pub struct StickFigureEditor {
    core: EditorSession,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn core_error(context: &str, err: EditorError) -> JsError {
    JsError::new(&format!("{context}: {err}"))
}

/// Plain objects instead of `Map`s for the keyed joint tables.
fn to_js<T: Serialize + ?Sized>(value: &T, context: &str) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("{context} error: {e}")))
}

fn parse_joint(name: &str) -> Result<Joint, JsError> {
    Joint::from_name(name).ok_or_else(|| JsError::new(&format!("unknown joint '{name}'")))
}

#[wasm_bindgen]
impl StickFigureEditor {
    /// Create an editor. Pass a config object or undefined/null for defaults.
    /// Example:
    ///   new StickFigureEditor({ canvas_width: 1024, default_duration_ms: 3000 })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<StickFigureEditor, JsError> {
        console_error_panic_hook::set_once();

        let cfg: EditorConfig = if jsvalue_is_undefined_or_null(&config) {
            EditorConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        let core = EditorSession::new(cfg).map_err(|e| core_error("config", e))?;
        Ok(StickFigureEditor { core })
    }

    // ----- views -----

    /// Working pose as `{ hip: {x, y}, angles: { jointName: radians } }`.
    #[wasm_bindgen(js_name = working_pose)]
    pub fn working_pose(&self) -> Result<JsValue, JsError> {
        to_js(self.core.working_pose(), "pose")
    }

    /// Joint positions of the working pose as `{ jointName: {x, y} }`.
    #[wasm_bindgen(js_name = joint_points)]
    pub fn joint_points(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.joint_points(), "points")
    }

    /// Keyframes as `[{ pose, time }]`, sorted by time.
    #[wasm_bindgen]
    pub fn keyframes(&self) -> Result<JsValue, JsError> {
        to_js(self.core.keyframes(), "keyframes")
    }

    /// Active keyframe index, or undefined.
    #[wasm_bindgen(js_name = active_index)]
    pub fn active_index(&self) -> Option<u32> {
        self.core.active_index().map(|i| i as u32)
    }

    /// `"stopped" | "playing" | "paused"`.
    #[wasm_bindgen(js_name = playback_state)]
    pub fn playback_state(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.playback_state(), "state")
    }

    /// `"loop" | "pingPong"`.
    #[wasm_bindgen]
    pub fn mode(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.mode(), "mode")
    }

    #[wasm_bindgen]
    pub fn progress(&self) -> f64 {
        self.core.progress()
    }

    #[wasm_bindgen(js_name = duration_ms)]
    pub fn duration_ms(&self) -> f64 {
        self.core.duration_ms()
    }

    /// True while a frame is requested; the page should call `frame(now)` on its
    /// next animation frame.
    #[wasm_bindgen(js_name = wants_frame)]
    pub fn wants_frame(&self) -> bool {
        self.core.pending_frame().is_some()
    }

    /// Motion trail `{ frames: [{ progress, points }], opacity }`, or null.
    #[wasm_bindgen(js_name = motion_trail)]
    pub fn motion_trail(&self) -> Result<JsValue, JsError> {
        match self.core.motion_trail() {
            Some(trail) => to_js(trail, "trail"),
            None => Ok(JsValue::NULL),
        }
    }

    /// Onion-skin neighbours of the active keyframe as `[{ index, opacity, side }]`.
    /// Empty unless onion mode is on.
    #[wasm_bindgen(js_name = onion_frames)]
    pub fn onion_frames(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.onion_frames(), "onion")
    }

    #[wasm_bindgen(js_name = can_insert_at_progress)]
    pub fn can_insert_at_progress(&self) -> bool {
        self.core.can_insert_at_progress()
    }

    /// `"seconds" | "frames"`.
    #[wasm_bindgen(js_name = time_unit)]
    pub fn time_unit(&self) -> String {
        self.core.time_unit().to_string()
    }

    #[wasm_bindgen(js_name = format_time)]
    pub fn format_time(&self, time: f64) -> String {
        self.core.format_time(time)
    }

    // ----- editing -----

    /// Save the working pose as a keyframe. Returns its index, or undefined while playing.
    #[wasm_bindgen(js_name = add_keyframe)]
    pub fn add_keyframe(&mut self) -> Option<u32> {
        self.core.add_keyframe().map(|i| i as u32)
    }

    /// Returns the removed keyframe, or undefined while playing.
    #[wasm_bindgen(js_name = delete_keyframe)]
    pub fn delete_keyframe(&mut self, index: u32) -> Result<JsValue, JsError> {
        match self
            .core
            .delete_keyframe(index as usize)
            .map_err(|e| core_error("delete_keyframe", e))?
        {
            Some(kf) => to_js(&kf, "keyframe"),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = select_keyframe)]
    pub fn select_keyframe(&mut self, index: u32) -> Result<bool, JsError> {
        self.core
            .select_keyframe(index as usize)
            .map_err(|e| core_error("select_keyframe", e))
    }

    #[wasm_bindgen(js_name = deselect_keyframe)]
    pub fn deselect_keyframe(&mut self) -> bool {
        self.core.deselect_keyframe()
    }

    /// Insert a pose object at a normalized time and select it.
    #[wasm_bindgen(js_name = insert_at_time)]
    pub fn insert_at_time(&mut self, pose: JsValue, time: f64) -> Result<Option<u32>, JsError> {
        let pose: Pose =
            swb::from_value(pose).map_err(|e| JsError::new(&format!("pose error: {e}")))?;
        Ok(self.core.insert_at_time(&pose, time).map(|i| i as u32))
    }

    #[wasm_bindgen(js_name = redistribute_even)]
    pub fn redistribute_even(&mut self) -> bool {
        self.core.redistribute_even()
    }

    #[wasm_bindgen]
    pub fn renormalize(&mut self) -> bool {
        self.core.renormalize()
    }

    /// Move a timeline marker. Returns the clamped time that was applied.
    #[wasm_bindgen(js_name = move_marker)]
    pub fn move_marker(&mut self, index: u32, time: f64) -> Result<Option<f64>, JsError> {
        self.core
            .move_marker(index as usize, time)
            .map_err(|e| core_error("move_marker", e))
    }

    /// Drag-and-drop reorder on the keyframe strip. Returns the new index.
    #[wasm_bindgen(js_name = reorder_keyframe)]
    pub fn reorder_keyframe(&mut self, from: u32, drop_index: u32) -> Result<Option<u32>, JsError> {
        let moved = self
            .core
            .reorder_keyframe(from as usize, drop_index as usize)
            .map_err(|e| core_error("reorder_keyframe", e))?;
        Ok(moved.map(|i| i as u32))
    }

    /// Drag a joint by name. With IK mode on, hands, feet and toes are solved
    /// with IK; otherwise the joint rotates about its parent and the hip translates.
    #[wasm_bindgen]
    pub fn drag(&mut self, joint: &str, x: f64, y: f64) -> Result<bool, JsError> {
        let joint = parse_joint(joint)?;
        Ok(self.core.drag(joint, Point::new(x, y)))
    }

    #[wasm_bindgen]
    pub fn scrub(&mut self, progress: f64) -> bool {
        self.core.scrub(progress)
    }

    // ----- transport -----

    /// Start playback at `now` (ms, e.g. `performance.now()`).
    #[wasm_bindgen]
    pub fn start(&mut self, now: f64) -> bool {
        self.core.start(now)
    }

    /// Advance to the animation-frame timestamp. Returns false when not playing.
    #[wasm_bindgen]
    pub fn frame(&mut self, timestamp: f64) -> bool {
        self.core.frame(timestamp)
    }

    #[wasm_bindgen]
    pub fn pause(&mut self, now: f64) -> bool {
        self.core.pause(now)
    }

    #[wasm_bindgen]
    pub fn resume(&mut self, now: f64) -> bool {
        self.core.resume(now)
    }

    #[wasm_bindgen]
    pub fn stop(&mut self) -> bool {
        self.core.stop()
    }

    #[wasm_bindgen(js_name = toggle_play)]
    pub fn toggle_play(&mut self, now: f64) -> bool {
        self.core.toggle_play(now)
    }

    #[wasm_bindgen(js_name = toggle_pause)]
    pub fn toggle_pause(&mut self, now: f64) -> bool {
        self.core.toggle_pause(now)
    }

    #[wasm_bindgen(js_name = insert_at_current_progress)]
    pub fn insert_at_current_progress(&mut self) -> Option<u32> {
        self.core.insert_at_current_progress().map(|i| i as u32)
    }

    // ----- settings -----

    #[wasm_bindgen(js_name = toggle_mode)]
    pub fn toggle_mode(&mut self) -> bool {
        self.core.toggle_mode()
    }

    #[wasm_bindgen(js_name = ik_mode)]
    pub fn ik_mode(&self) -> bool {
        self.core.ik_mode()
    }

    #[wasm_bindgen(js_name = toggle_ik_mode)]
    pub fn toggle_ik_mode(&mut self) -> bool {
        self.core.toggle_ik_mode()
    }

    #[wasm_bindgen(js_name = onion_mode)]
    pub fn onion_mode(&self) -> bool {
        self.core.onion_mode()
    }

    #[wasm_bindgen(js_name = toggle_onion_mode)]
    pub fn toggle_onion_mode(&mut self) -> bool {
        self.core.toggle_onion_mode()
    }

    #[wasm_bindgen(js_name = toggle_time_unit)]
    pub fn toggle_time_unit(&mut self) -> bool {
        self.core.toggle_time_unit()
    }

    /// Set the duration from a number and unit (`"seconds"`/`"s"`/`"frames"`/`"f"`).
    #[wasm_bindgen(js_name = set_duration)]
    pub fn set_duration(&mut self, value: f64, unit: &str) -> Result<(), JsError> {
        let unit: TimeUnit = unit.parse().map_err(|e| core_error("set_duration", e))?;
        self.core
            .set_duration(value, unit)
            .map_err(|e| core_error("set_duration", e))
    }

    /// Set the duration from the text field, read in the current time unit.
    #[wasm_bindgen(js_name = set_duration_text)]
    pub fn set_duration_text(&mut self, text: &str) -> Result<(), JsError> {
        self.core
            .set_duration_text(text)
            .map_err(|e| core_error("set_duration", e))
    }

    /// `{ enabled, resolution, fps }`; missing fields take their defaults.
    #[wasm_bindgen(js_name = set_trail_settings)]
    pub fn set_trail_settings(&mut self, settings: JsValue) -> Result<(), JsError> {
        let settings: TrailSettings = if jsvalue_is_undefined_or_null(&settings) {
            TrailSettings::default()
        } else {
            swb::from_value(settings)
                .map_err(|e| JsError::new(&format!("trail settings error: {e}")))?
        };
        self.core
            .set_trail_settings(settings)
            .map_err(|e| core_error("set_trail_settings", e))
    }

    #[wasm_bindgen(js_name = set_onion_range)]
    pub fn set_onion_range(&mut self, before: u32, after: u32) {
        self.core.set_onion_range(before as usize, after as usize);
    }

    // ----- documents -----

    /// Export the animation as a pretty-printed JSON string.
    /// `exported_at` is an optional ISO-8601 timestamp supplied by the page.
    #[wasm_bindgen(js_name = export_json)]
    pub fn export_json(&mut self, exported_at: Option<String>) -> Result<String, JsError> {
        self.core
            .export_document(exported_at)
            .and_then(|doc| doc.to_json())
            .map_err(|e| core_error("export", e))
    }

    /// Import a document given as a JSON string or an already-parsed object.
    /// Returns the number of keyframes loaded, or undefined while playing.
    #[wasm_bindgen(js_name = import_json)]
    pub fn import_json(&mut self, document: JsValue) -> Result<Option<u32>, JsError> {
        if jsvalue_is_undefined_or_null(&document) {
            return Err(JsError::new("import_json: document is null/undefined"));
        }
        let text = match document.as_string() {
            Some(s) => s,
            None => JSON::stringify(&document)
                .map_err(|e| JsError::new(&format!("import_json stringify error: {:?}", e)))?
                .as_string()
                .ok_or_else(|| JsError::new("import_json: stringify produced non-string"))?,
        };
        let loaded = self
            .core
            .import_document(&text)
            .map_err(|e| core_error("import", e))?;
        Ok(loaded.map(|n| n as u32))
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
