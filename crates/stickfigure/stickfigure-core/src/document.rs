//! JSON exchange documents.
//!
//! Export always writes the versioned envelope. Import accepts three shapes:
//! - the versioned envelope (`version` + `format: "stick-figure-animation"` + `keyframes`);
//! - a bare array of `{ pose, time }` records, times kept as written;
//! - a bare array of poses, spaced evenly over [0,1].
//!
//! Every imported pose is migrated to the current joint set (see [`migrate_pose`]).
//! Parsing is all-or-nothing: any malformed record fails the whole document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EditorError, Result};
use crate::joint::Joint;
use crate::keyframes::Keyframe;
use crate::pose::Pose;

pub const DOCUMENT_VERSION: &str = "1.0.0";
pub const DOCUMENT_FORMAT: &str = "stick-figure-animation";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub total_keyframes: usize,
    /// Normalized span between the first and last keyframe.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(rename = "hasIKSupport", default)]
    pub has_ik_support: bool,
}

/// Versioned export envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    pub keyframes: Vec<Keyframe>,
    pub metadata: DocumentMetadata,
}

impl ExportDocument {
    /// Pretty-printed JSON, two-space indent.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the export envelope. `exported_at` is an opaque timestamp string supplied
/// by the host (ISO-8601 in practice).
pub fn export_document(
    keyframes: &[Keyframe],
    duration_ms: f64,
    exported_at: Option<String>,
) -> Result<ExportDocument> {
    let (first, last) = match keyframes {
        [] => return Err(EditorError::NothingToExport),
        [first, .., last] => (first.time, last.time),
        [only] => (only.time, only.time),
    };
    Ok(ExportDocument {
        version: DOCUMENT_VERSION.to_string(),
        format: DOCUMENT_FORMAT.to_string(),
        exported_at,
        keyframes: keyframes.to_vec(),
        metadata: DocumentMetadata {
            total_keyframes: keyframes.len(),
            duration: last - first,
            duration_ms: Some(duration_ms),
            has_ik_support: true,
        },
    })
}

/// Which accepted shape a document was read from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DocumentKind {
    Versioned,
    KeyframeArray,
    PoseArray,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportedAnimation {
    /// Sorted ascending by time.
    pub keyframes: Vec<Keyframe>,
    /// Clip duration recorded in the document, when positive.
    pub duration_ms: Option<f64>,
    pub version: Option<String>,
    pub kind: DocumentKind,
}

/// Parse any accepted document from JSON text.
pub fn parse_document(json: &str) -> Result<ImportedAnimation> {
    let value: Value = serde_json::from_str(json)?;
    import_value(value)
}

/// Parse any accepted document from an already-decoded JSON value.
pub fn import_value(value: Value) -> Result<ImportedAnimation> {
    let mut imported = match value {
        Value::Object(mut map) if is_versioned(&map) => {
            let version = map.get("version").and_then(Value::as_str).map(str::to_string);
            let duration_ms = map
                .get("metadata")
                .and_then(|m| m.get("durationMs"))
                .and_then(Value::as_f64)
                .filter(|d| d.is_finite() && *d > 0.0);
            let Some(Value::Array(records)) = map.remove("keyframes") else {
                return Err(EditorError::InvalidDocument(
                    "versioned document: keyframes array missing".into(),
                ));
            };
            log::info!("importing animation document version {version:?}");
            ImportedAnimation {
                keyframes: keyframe_records(records)?,
                duration_ms,
                version,
                kind: DocumentKind::Versioned,
            }
        }
        Value::Array(items) => {
            let kind = match items.first() {
                None => DocumentKind::KeyframeArray,
                Some(first) if is_keyframe_record(first) => DocumentKind::KeyframeArray,
                Some(first) if first.get("hip").is_some() && first.get("angles").is_some() => {
                    DocumentKind::PoseArray
                }
                Some(_) => return Err(EditorError::UnrecognizedDocument),
            };
            log::info!("importing un-versioned {kind:?} with {} entries", items.len());
            let keyframes = match kind {
                DocumentKind::PoseArray => pose_records(items)?,
                _ => keyframe_records(items)?,
            };
            ImportedAnimation {
                keyframes,
                duration_ms: None,
                version: None,
                kind,
            }
        }
        _ => return Err(EditorError::UnrecognizedDocument),
    };

    imported.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(imported)
}

fn is_versioned(map: &serde_json::Map<String, Value>) -> bool {
    let has_version = match map.get("version") {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    };
    has_version
        && map.get("format").and_then(Value::as_str) == Some(DOCUMENT_FORMAT)
        && map.get("keyframes").is_some_and(|k| !k.is_null())
}

fn is_keyframe_record(value: &Value) -> bool {
    value.get("pose").is_some() && value.get("time").is_some_and(Value::is_number)
}

fn keyframe_records(records: Vec<Value>) -> Result<Vec<Keyframe>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let pose_value = record.get("pose").cloned().unwrap_or(Value::Null);
            let pose = decode_pose(pose_value)
                .map_err(|e| EditorError::InvalidDocument(format!("keyframe {i}: {e}")))?;
            let time = record.get("time").and_then(Value::as_f64).ok_or_else(|| {
                EditorError::InvalidDocument(format!("keyframe {i}: time must be a number"))
            })?;
            Ok(Keyframe::new(pose, time))
        })
        .collect()
}

fn pose_records(poses: Vec<Value>) -> Result<Vec<Keyframe>> {
    let n = poses.len();
    poses
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let pose = decode_pose(value)
                .map_err(|e| EditorError::InvalidDocument(format!("pose {i}: {e}")))?;
            let time = if n <= 1 {
                0.0
            } else {
                i as f64 / (n - 1) as f64
            };
            Ok(Keyframe::new(pose, time))
        })
        .collect()
}

fn decode_pose(value: Value) -> std::result::Result<Pose, String> {
    let numeric = |v: &Value, key: &str| v.get(key).is_some_and(Value::is_number);
    let hip_ok = value
        .get("hip")
        .is_some_and(|h| numeric(h, "x") && numeric(h, "y"));
    if !hip_ok {
        return Err("hip.x and hip.y must be numbers".into());
    }
    if !value.get("angles").is_some_and(Value::is_object) {
        return Err("angles must be an object".into());
    }
    let mut pose: Pose = serde_json::from_value(value).map_err(|e| e.to_string())?;
    migrate_pose(&mut pose);
    Ok(pose)
}

/// Bring a pose from an older joint set up to date.
///
/// Poses saved before the neck base existed stored the hip-to-neck direction under
/// `neck`; that angle moves to `neckBase` and `neck` falls back to its rest angle.
/// Any other missing joint is filled with its rest angle. Returns how many joints
/// were filled or moved.
pub fn migrate_pose(pose: &mut Pose) -> usize {
    let mut changed = 0;
    if pose.angle(Joint::NeckBase).is_none() {
        if let Some(neck) = pose.angles.remove(Joint::Neck) {
            pose.angles.set(Joint::NeckBase, neck);
            changed += 1;
        }
    }
    let filled = pose.fill_missing_with_rest();
    if filled > 0 {
        log::warn!("pose missing {filled} joint angle(s); filled with rest angles");
    }
    changed + filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Point;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn full_pose(x: f64) -> Pose {
        let mut p = Pose::new(Point::new(x, 100.0));
        p.fill_missing_with_rest();
        p
    }

    #[test]
    fn empty_store_has_nothing_to_export() {
        assert_eq!(
            export_document(&[], 5000.0, None),
            Err(EditorError::NothingToExport)
        );
    }

    #[test]
    fn export_metadata() {
        let kfs = vec![
            Keyframe::new(full_pose(0.0), 0.0),
            Keyframe::new(full_pose(1.0), 0.25),
            Keyframe::new(full_pose(2.0), 1.0),
        ];
        let doc = export_document(&kfs, 6000.0, Some("2026-01-01T00:00:00Z".into())).unwrap();
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["version"], "1.0.0");
        assert_eq!(v["format"], "stick-figure-animation");
        assert_eq!(v["exportedAt"], "2026-01-01T00:00:00Z");
        assert_eq!(v["metadata"]["totalKeyframes"], 3);
        assert_eq!(v["metadata"]["duration"], 1.0);
        assert_eq!(v["metadata"]["durationMs"], 6000.0);
        assert_eq!(v["metadata"]["hasIKSupport"], true);
        assert_eq!(v["keyframes"][1]["time"], 0.25);
        assert!(v["keyframes"][0]["pose"]["angles"]["neckBase"].is_number());
    }

    #[test]
    fn legacy_neck_moves_to_neck_base() {
        let json = r#"[{ "hip": { "x": 1, "y": 2 }, "angles": { "neck": 0.5, "head": -1.0 } }]"#;
        let imported = parse_document(json).unwrap();
        assert_eq!(imported.kind, DocumentKind::PoseArray);
        let pose = &imported.keyframes[0].pose;
        assert_eq!(pose.angle(Joint::NeckBase), Some(0.5));
        assert_eq!(pose.angle(Joint::Neck), Some(-FRAC_PI_2));
        assert_eq!(pose.angle(Joint::Head), Some(-1.0));
        assert_eq!(pose.angle(Joint::LeftToe), Some(PI));
        assert_eq!(pose.angle(Joint::RightToe), Some(0.0));
        assert!(pose.is_complete());
        assert_eq!(imported.keyframes[0].time, 0.0);
    }

    #[test]
    fn keyframe_array_keeps_times_and_sorts() {
        let json = r#"[
            { "pose": { "hip": { "x": 0, "y": 0 }, "angles": {} }, "time": 0.7 },
            { "pose": { "hip": { "x": 1, "y": 0 }, "angles": {} }, "time": 0.2 }
        ]"#;
        let imported = parse_document(json).unwrap();
        assert_eq!(imported.kind, DocumentKind::KeyframeArray);
        let times: Vec<f64> = imported.keyframes.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.2, 0.7]);
        assert_eq!(imported.keyframes[0].pose.hip.x, 1.0);
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert_eq!(
            parse_document(r#"{ "frames": [] }"#),
            Err(EditorError::UnrecognizedDocument)
        );
        assert_eq!(parse_document("[1, 2]"), Err(EditorError::UnrecognizedDocument));
        assert_eq!(parse_document("42"), Err(EditorError::UnrecognizedDocument));
        assert!(matches!(
            parse_document("not json"),
            Err(EditorError::DocumentParse(_))
        ));
    }

    #[test]
    fn rejects_malformed_records() {
        let missing_array =
            r#"{ "version": "1.0.0", "format": "stick-figure-animation", "keyframes": {} }"#;
        assert!(matches!(
            parse_document(missing_array),
            Err(EditorError::InvalidDocument(_))
        ));
        let bad_hip = r#"[{ "pose": { "hip": { "x": "a", "y": 0 }, "angles": {} }, "time": 0 }]"#;
        assert!(matches!(
            parse_document(bad_hip),
            Err(EditorError::InvalidDocument(_))
        ));
        let bad_angle = r#"[{ "hip": { "x": 0, "y": 0 }, "angles": { "head": "up" } }]"#;
        assert!(matches!(
            parse_document(bad_angle),
            Err(EditorError::InvalidDocument(_))
        ));
    }

    #[test]
    fn empty_array_imports_nothing() {
        let imported = parse_document("[]").unwrap();
        assert!(imported.keyframes.is_empty());
    }
}
