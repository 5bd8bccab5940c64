//! Non-linear animation data: tracks, strips, actions and curves

use std::fmt;

use cani2d_core::Vec2;
use serde::{Deserialize, Serialize};

/// Animation data attached to an armature object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationData {
    #[serde(default)]
    pub nla_tracks: Vec<NlaTrack>,
}

/// A named sequence of non-overlapping strips
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NlaTrack {
    pub name: String,
    /// Strips, assumed sorted by time and non-overlapping
    #[serde(default)]
    pub strips: Vec<NlaStrip>,
}

impl NlaTrack {
    /// End frame of the last strip, `None` for an empty track
    pub fn length(&self) -> Option<f64> {
        self.strips.last().map(|s| s.frame_end)
    }
}

/// A time-placed reference to an action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NlaStrip {
    #[serde(default)]
    pub name: String,
    /// Name of the referenced action
    pub action: String,
    pub frame_start: f64,
    pub frame_end: f64,
}

/// A reusable bundle of curves, grouped per bone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<ActionGroup>,
}

/// Curves of one bone inside an action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionGroup {
    /// Bone name
    pub name: String,
    #[serde(default)]
    pub channels: Vec<FCurve>,
}

/// Keyframes of a single scalar channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FCurve {
    /// Property path, e.g. `pose.bones["arm"].location`
    pub data_path: String,
    /// Vector component the curve drives
    pub array_index: usize,
    /// Keyframes, assumed sorted by frame
    #[serde(default)]
    pub keyframe_points: Vec<Keyframe>,
}

impl FCurve {
    /// Classify the curve's channel from its data path
    pub fn channel_kind(&self) -> ChannelKind {
        ChannelKind::from_data_path(&self.data_path)
    }
}

/// A keyframe with bezier handles; `x` is the frame, `y` the value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub co: Vec2,
    pub handle_left: Vec2,
    pub handle_right: Vec2,
}

impl Keyframe {
    pub fn new(co: Vec2, handle_left: Vec2, handle_right: Vec2) -> Self {
        Self { co, handle_left, handle_right }
    }
}

/// Semantic channel of a bone curve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Location,
    RotationQuaternion,
    Scale,
    /// Anything else (euler rotation, custom properties, ...)
    Unsupported(String),
}

impl ChannelKind {
    /// Classify by the suffix after the last `.` of a data path
    pub fn from_data_path(data_path: &str) -> Self {
        let suffix = data_path.rsplit('.').next().unwrap_or(data_path);
        match suffix {
            "location" => ChannelKind::Location,
            "rotation_quaternion" => ChannelKind::RotationQuaternion,
            "scale" => ChannelKind::Scale,
            other => ChannelKind::Unsupported(other.to_string()),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Location => write!(f, "location"),
            ChannelKind::RotationQuaternion => write!(f, "rotation_quaternion"),
            ChannelKind::Scale => write!(f, "scale"),
            ChannelKind::Unsupported(suffix) => write!(f, "{}", suffix),
        }
    }
}
