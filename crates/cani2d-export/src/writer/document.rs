//! Serializable document layout
//!
//! Field order of `Cani2dDocument` is the key order of the written file.
//! JSON objects whose keys come from the scene (vertex groups, tracks,
//! bones) are kept as ordered entry lists so they are written in the order
//! they were first seen.

use serde::ser::{Serialize, SerializeMap, SerializeTuple, Serializer};

use crate::animation::{BoneCurves, CurveType, ExportKey, MergedCurve, MergedTrack};
use crate::geometry::{ExportFace, Geometry};
use crate::options::ExportOptions;
use crate::skeleton::ExportBone;

/// Ordered `name -> value` pairs written as a JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct NamedEntries<T>(pub Vec<(String, T)>);

impl<T> Default for NamedEntries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> NamedEntries<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }
}

impl<T> FromIterator<(String, T)> for NamedEntries<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Serialize> Serialize for NamedEntries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// `[vertex_index, weight]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMember(pub usize, pub f64);

impl Serialize for GroupMember {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.0)?;
        tuple.serialize_element(&self.1)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FaceRecord {
    pub z: f64,
    pub vertices: Vec<usize>,
}

impl From<&ExportFace> for FaceRecord {
    fn from(face: &ExportFace) -> Self {
        Self {
            z: face.z,
            vertices: face.vertices.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BoneRecord {
    pub name: String,
    pub head: [f64; 2],
    /// `[w, x, y, z]`, present only when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f64; 4]>,
    pub children: Vec<BoneRecord>,
}

impl BoneRecord {
    fn from_bone(bone: &ExportBone, with_rotation: bool) -> Self {
        Self {
            name: bone.name.clone(),
            head: bone.head,
            rotation: with_rotation.then(|| bone.rotation.to_array()),
            children: bone
                .children
                .iter()
                .map(|child| Self::from_bone(child, with_rotation))
                .collect(),
        }
    }
}

/// `["l" | "q" | "s", component]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveTag(pub CurveType, pub usize);

impl Serialize for CurveTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(self.0.tag())?;
        tuple.serialize_element(&self.1)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CurveRecord {
    #[serde(rename = "type")]
    pub tag: CurveTag,
    pub keys: Vec<ExportKey>,
}

impl From<&MergedCurve> for CurveRecord {
    fn from(curve: &MergedCurve) -> Self {
        Self {
            tag: CurveTag(curve.curve_type, curve.component),
            keys: curve.keys.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AnimationRecord {
    pub length: f64,
    pub curves: NamedEntries<Vec<CurveRecord>>,
}

impl From<&MergedTrack> for AnimationRecord {
    fn from(track: &MergedTrack) -> Self {
        Self {
            length: track.length,
            curves: track
                .bones
                .iter()
                .map(|BoneCurves { bone, curves }| (bone.clone(), curves.iter().map(CurveRecord::from).collect()))
                .collect(),
        }
    }
}

/// The complete cani2d document
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Cani2dDocument {
    pub exporter_version: [u32; 3],
    pub faces: Vec<FaceRecord>,
    /// `x, -y` pairs in vertex order
    pub vertices: Vec<f64>,
    /// `u, 1 - v` pairs in vertex order, or face-corner order for per-corner layers
    pub uv: Vec<f64>,
    pub vertex_groups: NamedEntries<Vec<GroupMember>>,
    pub bones: Vec<BoneRecord>,
    pub animations: NamedEntries<AnimationRecord>,
}

impl Cani2dDocument {
    /// Assemble the document from the component outputs
    pub fn assemble(
        geometry: &Geometry,
        bones: &[ExportBone],
        tracks: &[MergedTrack],
        options: &ExportOptions,
    ) -> Self {
        let vertices = geometry.vertices.iter().flat_map(|v| v.position).collect();
        let uv = geometry.uv_pairs().into_iter().flatten().collect();

        let vertex_groups = geometry
            .group_members()
            .into_iter()
            .map(|(name, members)| {
                let members = members.into_iter().map(|(idx, weight)| GroupMember(idx, weight)).collect();
                (name.to_string(), members)
            })
            .collect();

        Self {
            exporter_version: options.exporter_version,
            faces: geometry.faces.iter().map(FaceRecord::from).collect(),
            vertices,
            uv,
            vertex_groups,
            bones: bones
                .iter()
                .map(|bone| BoneRecord::from_bone(bone, options.emit_bone_rotation))
                .collect(),
            animations: tracks
                .iter()
                .map(|track| (track.name.clone(), AnimationRecord::from(track)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ExportVertex;
    use cani2d_scene::UvLayout;
    use cani2d_core::Quat;

    fn triangle() -> Geometry {
        Geometry {
            faces: vec![ExportFace { z: 0.5, vertices: vec![0, 1, 2], uv: vec![] }],
            vertices: vec![
                ExportVertex { position: [0.0, -0.0], uv: Some([0.0, 1.0]), weights: vec![(0, 1.0)] },
                ExportVertex { position: [1.0, -0.0], uv: Some([1.0, 1.0]), weights: vec![] },
                ExportVertex { position: [0.0, -1.0], uv: Some([0.0, 0.0]), weights: vec![(0, 0.5)] },
            ],
            group_names: vec!["root".into()],
            uv_layout: UvLayout::PerVertex,
        }
    }

    #[test]
    fn test_key_order() {
        let doc = Cani2dDocument::assemble(&triangle(), &[], &[], &ExportOptions::default());
        let json = serde_json::to_string(&doc).unwrap();

        let positions: Vec<usize> = ["exporter_version", "faces", "vertices", "uv", "vertex_groups", "bones", "animations"]
            .iter()
            .map(|key| json.find(&format!("\"{key}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_flattened_arrays() {
        let doc = Cani2dDocument::assemble(&triangle(), &[], &[], &ExportOptions::default());

        assert_eq!(doc.vertices.len(), 6);
        assert_eq!(doc.uv, vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            doc.vertex_groups.get("root"),
            Some(&vec![GroupMember(0, 1.0), GroupMember(2, 0.5)])
        );

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["vertex_groups"]["root"], serde_json::json!([[0, 1.0], [2, 0.5]]));
    }

    #[test]
    fn test_per_corner_uv_written_in_face_order() {
        let mut geometry = triangle();
        geometry.uv_layout = UvLayout::PerLoop;
        for vertex in &mut geometry.vertices {
            vertex.uv = None;
        }
        geometry.faces[0].uv = vec![[0.5, 0.5], [0.25, 0.75], [1.0, 0.0]];

        let doc = Cani2dDocument::assemble(&geometry, &[], &[], &ExportOptions::default());
        assert_eq!(doc.vertices.len(), 6);
        assert_eq!(doc.uv, vec![0.5, 0.5, 0.25, 0.75, 1.0, 0.0]);
    }

    #[test]
    fn test_bone_rotation_optional() {
        let bones = vec![ExportBone {
            name: "root".into(),
            head: [1.0, -2.0],
            rotation: Quat::new(-1.0, 0.0, 0.0, 0.0),
            children: vec![],
        }];

        let plain = Cani2dDocument::assemble(&triangle(), &bones, &[], &ExportOptions::default());
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json["bones"][0].get("rotation").is_none());

        let options = ExportOptions { emit_bone_rotation: true, ..ExportOptions::default() };
        let with_rotation = Cani2dDocument::assemble(&triangle(), &bones, &[], &options);
        let json = serde_json::to_value(&with_rotation).unwrap();
        assert_eq!(json["bones"][0]["rotation"], serde_json::json!([-1.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_animation_layout() {
        let track = MergedTrack {
            name: "walk".into(),
            length: 20.0,
            bones: vec![BoneCurves {
                bone: "leg".into(),
                curves: vec![MergedCurve {
                    curve_type: CurveType::Quaternion,
                    component: 1,
                    keys: vec![ExportKey {
                        frame: 5.0,
                        value: -0.5,
                        handle_left: [4.0, -0.5],
                        handle_right: [6.0, -0.5],
                    }],
                }],
            }],
        };

        let doc = Cani2dDocument::assemble(&triangle(), &[], &[track], &ExportOptions::default());
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json["animations"]["walk"],
            serde_json::json!({
                "length": 20.0,
                "curves": { "leg": [{ "type": ["q", 1], "keys": [[5.0, -0.5, [4.0, -0.5], [6.0, -0.5]]] }] }
            })
        );
    }
}
