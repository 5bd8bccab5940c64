//! Geometry extraction: faces, vertices, UVs and skin weights
//!
//! Each exported vertex is one record carrying its position, group weights
//! and, for per-vertex UV layers, its UV. Per-corner UV layers travel with
//! the faces instead, so every parallel array of the file format is
//! flattened from records of a single iteration.

use cani2d_core::{Result, ResultExt};
use cani2d_scene::{MeshData, SceneObject, UvLayer, UvLayout};
use tracing::debug;

/// A polygon ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFace {
    /// Mean mesh-local Z of the polygon's vertices, used for paint order
    pub z: f64,
    pub vertices: Vec<usize>,
    /// Corner UVs, one per entry of `vertices`; empty for per-vertex layers
    pub uv: Vec<[f64; 2]>,
}

/// A vertex ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportVertex {
    /// World-translated position on the Y-down plane
    pub position: [f64; 2],
    /// UV in the target texture space (V flipped), for per-vertex layers
    pub uv: Option<[f64; 2]>,
    /// `(group index, weight)` memberships
    pub weights: Vec<(usize, f64)>,
}

/// Everything the writer needs from the mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub faces: Vec<ExportFace>,
    pub vertices: Vec<ExportVertex>,
    /// Vertex group names, indexed by the group index in `weights`
    pub group_names: Vec<String>,
    /// Whether UVs live on `vertices` or on `faces`
    pub uv_layout: UvLayout,
}

impl Geometry {
    /// Member `(vertex index, weight)` pairs of each group, in group order
    pub fn group_members(&self) -> Vec<(&str, Vec<(usize, f64)>)> {
        let mut members: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.group_names.len()];

        for (vertex_idx, vertex) in self.vertices.iter().enumerate() {
            for &(group, weight) in &vertex.weights {
                if let Some(list) = members.get_mut(group) {
                    list.push((vertex_idx, weight));
                }
            }
        }

        self.group_names
            .iter()
            .map(String::as_str)
            .zip(members)
            .collect()
    }

    /// UVs in the order the layer stores them: by vertex, or by face corner
    pub fn uv_pairs(&self) -> Vec<[f64; 2]> {
        match self.uv_layout {
            UvLayout::PerVertex => self.vertices.iter().filter_map(|v| v.uv).collect(),
            UvLayout::PerLoop => self.faces.iter().flat_map(|f| f.uv.iter().copied()).collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Flatten a mesh object into export records
///
/// Only the object's world translation is applied; its rotation and scale
/// are not baked in. Fails when the mesh indexes out of range or `uv_layer`
/// matches neither the vertex count nor the face-corner count.
pub fn extract_geometry(object: &SceneObject, mesh: &MeshData, uv_layer: &UvLayer) -> Result<Geometry> {
    mesh.validate()
        .with_context(|| format!("validating mesh object '{}'", object.name))?;
    let uv_layout = mesh
        .uv_layout(uv_layer)
        .with_context(|| format!("mesh object '{}'", object.name))?;

    let translation = object.world_translation();
    let uvs = &uv_layer.data;

    let mut corner = 0;
    let faces = mesh
        .polygons
        .iter()
        .map(|polygon| {
            let corners = polygon.vertices.len();
            let z_sum: f64 = polygon.vertices.iter().map(|&v| mesh.vertices[v].co.z).sum();
            let uv = match uv_layout {
                UvLayout::PerVertex => Vec::new(),
                UvLayout::PerLoop => uvs[corner..corner + corners]
                    .iter()
                    .map(|uv| uv.to_texture_space())
                    .collect(),
            };
            corner += corners;

            ExportFace {
                z: z_sum / corners as f64,
                vertices: polygon.vertices.clone(),
                uv,
            }
        })
        .collect();

    let vertices = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(idx, vertex)| ExportVertex {
            position: (vertex.co + translation).to_plane(),
            uv: match uv_layout {
                UvLayout::PerVertex => Some(uvs[idx].to_texture_space()),
                UvLayout::PerLoop => None,
            },
            weights: vertex.groups.iter().map(|g| (g.group, g.weight)).collect(),
        })
        .collect();

    let geometry = Geometry {
        faces,
        vertices,
        group_names: mesh.vertex_groups.clone(),
        uv_layout,
    };

    debug!(
        vertices = geometry.vertex_count(),
        faces = geometry.face_count(),
        groups = geometry.group_names.len(),
        uv_layout = ?uv_layout,
        "Geometry extracted"
    );

    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cani2d_core::{Error, Mat4x4, Vec2, Vec3};
    use cani2d_scene::{MeshVertex, ObjectData, Polygon};

    fn object_at(translation: Vec3) -> SceneObject {
        let mut object = SceneObject::new("obj", ObjectData::Empty);
        object.world_matrix = Mat4x4::from_translation(translation);
        object
    }

    fn slanted_quad() -> MeshData {
        MeshData {
            name: "quad".into(),
            vertices: vec![
                MeshVertex::new(Vec3::new(0.0, 0.0, 0.0)).with_group(1, 1.0),
                MeshVertex::new(Vec3::new(2.0, 0.0, 1.0)).with_group(0, 0.25).with_group(1, 0.75),
                MeshVertex::new(Vec3::new(2.0, 3.0, 2.0)),
                MeshVertex::new(Vec3::new(0.0, 3.0, 1.0)).with_group(0, 1.0),
            ],
            polygons: vec![Polygon::new(vec![0, 1, 2, 3]), Polygon::new(vec![2, 3, 0])],
            uv_layers: vec![UvLayer {
                name: "UVMap".into(),
                data: vec![
                    Vec2::new(0.0, 0.0),
                    Vec2::new(1.0, 0.0),
                    Vec2::new(1.0, 0.75),
                    Vec2::new(0.0, 1.0),
                ],
            }],
            vertex_groups: vec!["head".into(), "body".into()],
        }
    }

    fn extract(object: &SceneObject, mesh: &MeshData) -> Geometry {
        extract_geometry(object, mesh, &mesh.uv_layers[0]).unwrap()
    }

    #[test]
    fn test_face_z_is_mean_local_z() {
        let geometry = extract(&object_at(Vec3::new(0.0, 0.0, 100.0)), &slanted_quad());

        assert_eq!(geometry.faces.len(), 2);
        assert_eq!(geometry.faces[0].z, 1.0);
        assert_eq!(geometry.faces[0].vertices, vec![0, 1, 2, 3]);
        assert_eq!(geometry.faces[1].z, 1.0);
    }

    #[test]
    fn test_positions_translated_and_mirrored() {
        let geometry = extract(&object_at(Vec3::new(10.0, 20.0, 30.0)), &slanted_quad());

        assert_eq!(geometry.vertices[0].position, [10.0, -20.0]);
        assert_eq!(geometry.vertices[2].position, [12.0, -23.0]);
    }

    #[test]
    fn test_per_vertex_uv_v_flipped() {
        let geometry = extract(&object_at(Vec3::ZERO), &slanted_quad());

        assert_eq!(geometry.uv_layout, UvLayout::PerVertex);
        assert!(geometry.faces.iter().all(|f| f.uv.is_empty()));
        assert_eq!(
            geometry.uv_pairs(),
            vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.25], [0.0, 0.0]]
        );
    }

    #[test]
    fn test_per_corner_uv_follows_faces() {
        let mut mesh = slanted_quad();
        mesh.uv_layers[0].data = (0..7).map(|i| Vec2::new(i as f64, 0.5)).collect();

        let geometry = extract(&object_at(Vec3::ZERO), &mesh);
        assert_eq!(geometry.uv_layout, UvLayout::PerLoop);
        assert!(geometry.vertices.iter().all(|v| v.uv.is_none()));
        assert_eq!(geometry.faces[0].uv.len(), 4);
        assert_eq!(geometry.faces[1].uv, vec![[4.0, 0.5], [5.0, 0.5], [6.0, 0.5]]);
        assert_eq!(geometry.uv_pairs().len(), 7);
    }

    #[test]
    fn test_mismatched_uv_layer_is_error() {
        let mut mesh = slanted_quad();
        mesh.uv_layers[0].data.truncate(2);

        let err = extract_geometry(&object_at(Vec3::ZERO), &mesh, &mesh.uv_layers[0]).unwrap_err();
        assert!(matches!(err.root(), Error::UvLayerMismatch { found: 2, .. }));
    }

    #[test]
    fn test_group_members_in_vertex_order() {
        let geometry = extract(&object_at(Vec3::ZERO), &slanted_quad());

        let members = geometry.group_members();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0], ("head", vec![(1, 0.25), (3, 1.0)]));
        assert_eq!(members[1], ("body", vec![(0, 1.0), (1, 0.75)]));
    }

    #[test]
    fn test_empty_group_is_kept() {
        let mut mesh = slanted_quad();
        mesh.vertex_groups.push("unused".into());

        let geometry = extract(&object_at(Vec3::ZERO), &mesh);
        let members = geometry.group_members();
        assert_eq!(members[2], ("unused", vec![]));
    }
}
