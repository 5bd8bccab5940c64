//! Animation merging
//!
//! Every NLA track becomes one continuous timeline. Strips are visited in
//! their stored order and their keyframes are shifted by the strip's
//! `frame_start`, then appended to the curve identified by
//! (bone, curve type, component). Keys are never re-sorted, so tracks must
//! hold time-ordered, non-overlapping strips.

use std::collections::HashMap;

use cani2d_core::Error;
use cani2d_scene::{AnimationData, ChannelKind, FCurve, Keyframe, NlaStrip, NlaTrack, Scene};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use tracing::{debug, warn};

use crate::error::ExportResult;
use crate::report::ExportWarning;

/// Curve channels the format understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveType {
    Location,
    Quaternion,
    Scale,
}

impl CurveType {
    /// Map a channel onto a curve type; unsupported channels have none
    pub fn from_channel(kind: &ChannelKind) -> Option<Self> {
        match kind {
            ChannelKind::Location => Some(CurveType::Location),
            ChannelKind::RotationQuaternion => Some(CurveType::Quaternion),
            ChannelKind::Scale => Some(CurveType::Scale),
            ChannelKind::Unsupported(_) => None,
        }
    }

    /// Single-letter tag written to the file
    pub fn tag(self) -> &'static str {
        match self {
            CurveType::Location => "l",
            CurveType::Quaternion => "q",
            CurveType::Scale => "s",
        }
    }
}

/// A keyframe on the track's global timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportKey {
    pub frame: f64,
    pub value: f64,
    /// `[frame, value]`
    pub handle_left: [f64; 2],
    /// `[frame, value]`
    pub handle_right: [f64; 2],
}

impl Serialize for ExportKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.frame)?;
        tuple.serialize_element(&self.value)?;
        tuple.serialize_element(&self.handle_left)?;
        tuple.serialize_element(&self.handle_right)?;
        tuple.end()
    }
}

/// All keys of one (type, component) channel of a bone
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCurve {
    pub curve_type: CurveType,
    pub component: usize,
    pub keys: Vec<ExportKey>,
}

/// Curves of one bone, in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct BoneCurves {
    pub bone: String,
    pub curves: Vec<MergedCurve>,
}

/// One track merged into a single timeline
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTrack {
    pub name: String,
    /// End frame of the last strip
    pub length: f64,
    pub bones: Vec<BoneCurves>,
}

impl MergedTrack {
    /// Look up the merged curve of a bone channel
    pub fn curve(&self, bone: &str, curve_type: CurveType, component: usize) -> Option<&MergedCurve> {
        self.bones
            .iter()
            .find(|b| b.bone == bone)?
            .curves
            .iter()
            .find(|c| c.curve_type == curve_type && c.component == component)
    }
}

/// Merges NLA tracks against the actions of a scene
pub struct AnimationMerger<'a> {
    scene: &'a Scene,
    mirror_location_handles: bool,
    warnings: Vec<ExportWarning>,
}

impl<'a> AnimationMerger<'a> {
    pub fn new(scene: &'a Scene, mirror_location_handles: bool) -> Self {
        Self {
            scene,
            mirror_location_handles,
            warnings: Vec::new(),
        }
    }

    /// Merge every non-empty track, in track order
    pub fn merge_all(&mut self, animation: &AnimationData) -> ExportResult<Vec<MergedTrack>> {
        let mut tracks = Vec::with_capacity(animation.nla_tracks.len());
        for track in &animation.nla_tracks {
            if let Some(merged) = self.merge_track(track)? {
                tracks.push(merged);
            }
        }
        Ok(tracks)
    }

    /// Merge one track; `None` for a track without strips
    pub fn merge_track(&mut self, track: &NlaTrack) -> ExportResult<Option<MergedTrack>> {
        let Some(length) = track.length() else {
            debug!(track = %track.name, "Skipping track without strips");
            return Ok(None);
        };

        let scene = self.scene;
        let mut channels = ChannelTable::default();

        for strip in &track.strips {
            let action = scene.action(&strip.action).ok_or_else(|| Error::UnknownAction {
                track: track.name.clone(),
                strip: strip.name.clone(),
                action: strip.action.clone(),
            })?;

            for group in &action.groups {
                for curve in &group.channels {
                    let kind = curve.channel_kind();
                    let Some(curve_type) = CurveType::from_channel(&kind) else {
                        self.report_unsupported(track, strip, &group.name, curve, &kind);
                        continue;
                    };

                    let keys = curve
                        .keyframe_points
                        .iter()
                        .map(|key| self.rebase_key(key, strip.frame_start, curve_type, curve.array_index));
                    channels.extend(&group.name, curve_type, curve.array_index, keys);
                }
            }
        }

        let bones = channels.into_bones();
        debug!(
            track = %track.name,
            strips = track.strips.len(),
            bones = bones.len(),
            length,
            "Track merged"
        );

        Ok(Some(MergedTrack {
            name: track.name.clone(),
            length,
            bones,
        }))
    }

    /// Warnings collected so far
    pub fn into_warnings(self) -> Vec<ExportWarning> {
        self.warnings
    }

    fn report_unsupported(
        &mut self,
        track: &NlaTrack,
        strip: &NlaStrip,
        bone: &str,
        curve: &FCurve,
        kind: &ChannelKind,
    ) {
        warn!(
            track = %track.name,
            strip = %strip.name,
            bone = %bone,
            channel = %kind,
            data_path = %curve.data_path,
            "Unsupported curve type, keyframes dropped"
        );
        self.warnings.push(ExportWarning::UnsupportedChannel {
            track: track.name.clone(),
            strip: strip.name.clone(),
            bone: bone.to_string(),
            data_path: curve.data_path.clone(),
        });
    }

    fn rebase_key(&self, key: &Keyframe, offset: f64, curve_type: CurveType, component: usize) -> ExportKey {
        let (mirror_value, mirror_handles) = match (curve_type, component) {
            (CurveType::Quaternion, 0 | 1) => (true, true),
            (CurveType::Location, 1) => (true, self.mirror_location_handles),
            _ => (false, false),
        };

        let value_sign = if mirror_value { -1.0 } else { 1.0 };
        let handle_sign = if mirror_handles { -1.0 } else { 1.0 };

        ExportKey {
            frame: key.co.x + offset,
            value: key.co.y * value_sign,
            handle_left: [key.handle_left.x + offset, key.handle_left.y * handle_sign],
            handle_right: [key.handle_right.x + offset, key.handle_right.y * handle_sign],
        }
    }
}

/// Append-only keys per (bone, type, component), remembering first-seen order
#[derive(Default)]
struct ChannelTable {
    index: HashMap<(String, CurveType, usize), usize>,
    order: Vec<(String, CurveType, usize)>,
    keys: Vec<Vec<ExportKey>>,
}

impl ChannelTable {
    fn extend(
        &mut self,
        bone: &str,
        curve_type: CurveType,
        component: usize,
        keys: impl Iterator<Item = ExportKey>,
    ) {
        let id = (bone.to_string(), curve_type, component);
        let slot = match self.index.get(&id) {
            Some(&slot) => slot,
            None => {
                let slot = self.keys.len();
                self.index.insert(id.clone(), slot);
                self.order.push(id);
                self.keys.push(Vec::new());
                slot
            }
        };
        self.keys[slot].extend(keys);
    }

    fn into_bones(self) -> Vec<BoneCurves> {
        let mut bones: Vec<BoneCurves> = Vec::new();
        for ((bone, curve_type, component), keys) in self.order.into_iter().zip(self.keys) {
            let curve = MergedCurve { curve_type, component, keys };
            match bones.iter_mut().find(|b| b.bone == bone) {
                Some(entry) => entry.curves.push(curve),
                None => bones.push(BoneCurves { bone, curves: vec![curve] }),
            }
        }
        bones
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cani2d_core::Vec2;
    use cani2d_scene::{Action, ActionGroup};

    fn curve(data_path: &str, array_index: usize, keys: Vec<Keyframe>) -> FCurve {
        FCurve {
            data_path: data_path.to_string(),
            array_index,
            keyframe_points: keys,
        }
    }

    fn action(name: &str, bone: &str, channels: Vec<FCurve>) -> Action {
        Action {
            name: name.to_string(),
            groups: vec![ActionGroup { name: bone.to_string(), channels }],
        }
    }

    fn strip(action: &str, frame_start: f64, frame_end: f64) -> NlaStrip {
        NlaStrip {
            name: action.to_string(),
            action: action.to_string(),
            frame_start,
            frame_end,
        }
    }

    fn keyed(frame: f64, value: f64) -> Keyframe {
        Keyframe::new(
            Vec2::new(frame, value),
            Vec2::new(frame - 1.0, value + 0.5),
            Vec2::new(frame + 1.0, value - 0.5),
        )
    }

    #[test]
    fn test_rebase_and_quaternion_mirror() {
        let scene = Scene {
            objects: vec![],
            actions: vec![action(
                "turn",
                "arm",
                vec![curve("pose.bones[\"arm\"].rotation_quaternion", 1, vec![keyed(2.0, 0.25)])],
            )],
        };
        let track = NlaTrack { name: "t".into(), strips: vec![strip("turn", 10.0, 20.0)] };

        let mut merger = AnimationMerger::new(&scene, true);
        let merged = merger.merge_track(&track).unwrap().unwrap();

        let key = merged.curve("arm", CurveType::Quaternion, 1).unwrap().keys[0];
        assert_eq!(key.frame, 12.0);
        assert_eq!(key.value, -0.25);
        assert_eq!(key.handle_left, [11.0, -0.75]);
        assert_eq!(key.handle_right, [13.0, 0.25]);
    }

    #[test]
    fn test_location_y_handles_follow_option() {
        let scene = Scene {
            objects: vec![],
            actions: vec![action("move", "root", vec![curve("location", 1, vec![keyed(0.0, 2.0)])])],
        };
        let track = NlaTrack { name: "t".into(), strips: vec![strip("move", 0.0, 5.0)] };

        let mirrored = AnimationMerger::new(&scene, true).merge_track(&track).unwrap().unwrap();
        let key = mirrored.curve("root", CurveType::Location, 1).unwrap().keys[0];
        assert_eq!(key.value, -2.0);
        assert_eq!(key.handle_left[1], -2.5);

        let legacy = AnimationMerger::new(&scene, false).merge_track(&track).unwrap().unwrap();
        let key = legacy.curve("root", CurveType::Location, 1).unwrap().keys[0];
        assert_eq!(key.value, -2.0);
        assert_eq!(key.handle_left[1], 2.5);
        assert_eq!(key.handle_right[1], 1.5);
    }

    #[test]
    fn test_scale_and_other_components_pass_through() {
        let scene = Scene {
            objects: vec![],
            actions: vec![action(
                "pulse",
                "root",
                vec![
                    curve("scale", 1, vec![keyed(0.0, 2.0)]),
                    curve("location", 0, vec![keyed(0.0, 3.0)]),
                    curve("rotation_quaternion", 2, vec![keyed(0.0, 0.5)]),
                ],
            )],
        };
        let track = NlaTrack { name: "t".into(), strips: vec![strip("pulse", 0.0, 1.0)] };

        let merged = AnimationMerger::new(&scene, true).merge_track(&track).unwrap().unwrap();
        assert_eq!(merged.curve("root", CurveType::Scale, 1).unwrap().keys[0].value, 2.0);
        assert_eq!(merged.curve("root", CurveType::Location, 0).unwrap().keys[0].value, 3.0);
        assert_eq!(merged.curve("root", CurveType::Quaternion, 2).unwrap().keys[0].value, 0.5);
    }

    #[test]
    fn test_empty_track_skipped() {
        let scene = Scene::default();
        let track = NlaTrack { name: "idle".into(), strips: vec![] };

        assert!(AnimationMerger::new(&scene, true).merge_track(&track).unwrap().is_none());
    }

    #[test]
    fn test_unknown_action_is_error() {
        let scene = Scene::default();
        let track = NlaTrack { name: "t".into(), strips: vec![strip("ghost", 0.0, 1.0)] };

        let err = AnimationMerger::new(&scene, true).merge_track(&track).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_first_seen_order() {
        let scene = Scene {
            objects: vec![],
            actions: vec![
                Action {
                    name: "a".into(),
                    groups: vec![
                        ActionGroup { name: "spine".into(), channels: vec![curve("scale", 2, vec![keyed(0.0, 1.0)])] },
                        ActionGroup { name: "arm".into(), channels: vec![curve("location", 0, vec![keyed(0.0, 1.0)])] },
                    ],
                },
                action("b", "spine", vec![curve("location", 1, vec![keyed(0.0, 1.0)])]),
            ],
        };
        let track = NlaTrack {
            name: "t".into(),
            strips: vec![strip("a", 0.0, 10.0), strip("b", 10.0, 20.0)],
        };

        let merged = AnimationMerger::new(&scene, true).merge_track(&track).unwrap().unwrap();
        let bones: Vec<_> = merged.bones.iter().map(|b| b.bone.as_str()).collect();
        assert_eq!(bones, vec!["spine", "arm"]);

        let spine: Vec<_> = merged.bones[0].curves.iter().map(|c| (c.curve_type, c.component)).collect();
        assert_eq!(spine, vec![(CurveType::Scale, 2), (CurveType::Location, 1)]);
    }

    #[test]
    fn test_key_serializes_as_nested_array() {
        let key = ExportKey {
            frame: 1.0,
            value: -0.5,
            handle_left: [0.0, -0.5],
            handle_right: [2.5, -0.5],
        };
        assert_eq!(serde_json::to_string(&key).unwrap(), "[1.0,-0.5,[0.0,-0.5],[2.5,-0.5]]");
    }
}
