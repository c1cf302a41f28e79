//! Stick-figure animation core (engine-agnostic)
//!
//! Angle-based poses over a fixed 14-joint skeleton, analytic FK/IK, a keyframe
//! store with time-renormalization rules, shortest-path pose interpolation and a
//! playback state machine. Rendering and input handling live in adapters
//! (see `stickfigure-wasm`); this crate only owns state and math.

pub mod config;
pub mod document;
pub mod error;
pub mod ik;
pub mod interp;
pub mod joint;
pub mod keyframes;
pub mod kinematics;
pub mod playback;
pub mod pose;
pub mod session;
pub mod skeleton;
pub mod timecode;
pub mod trail;

// Re-exports for consumers (adapters)
pub use config::EditorConfig;
pub use document::{
    export_document, parse_document, DocumentKind, ExportDocument, ImportedAnimation,
};
pub use error::{EditorError, Result};
pub use ik::{solve_ik_for_end_effector, solve_two_joint_ik, EndEffector, IkChain};
pub use interp::{interpolate_pose, lerp, lerp_angle, pose_at_progress};
pub use joint::Joint;
pub use keyframes::{DeletedKeyframe, Keyframe, KeyframeStore};
pub use kinematics::{points_from_pose, pose_from_points, JointPoints};
pub use playback::{
    cycle_progress, FrameHost, FrameId, ManualFrameHost, Playback, PlaybackMode, PlaybackState,
};
pub use pose::{JointAngles, Point, Pose};
pub use session::EditorSession;
pub use skeleton::Skeleton;
pub use timecode::{format_time, parse_duration, TimeUnit};
pub use trail::{onion_skin, MotionTrail, OnionFrame, OnionSide, TrailFrame, TrailSettings};
