//! Mesh data as seen in the scene snapshot

use cani2d_core::{Error, Result, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Mesh datablock of a mesh object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    /// Mesh datablock name
    #[serde(default)]
    pub name: String,
    /// Vertices in mesh order
    pub vertices: Vec<MeshVertex>,
    /// Polygons referencing vertices by index
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    /// UV layers; only the first one is exported
    #[serde(default)]
    pub uv_layers: Vec<UvLayer>,
    /// Vertex group names, indexed by `GroupWeight::group`
    #[serde(default)]
    pub vertex_groups: Vec<String>,
}

impl MeshData {
    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get face count
    pub fn face_count(&self) -> usize {
        self.polygons.len()
    }

    /// Total number of face corners (loops) over all polygons
    pub fn loop_count(&self) -> usize {
        self.polygons.iter().map(|p| p.vertices.len()).sum()
    }

    /// The layer the exporter reads UVs from
    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        self.uv_layers.first()
    }

    /// How `layer` is indexed, judged by its length
    ///
    /// A layer holding one coordinate per vertex wins when the vertex and
    /// corner counts coincide.
    pub fn uv_layout(&self, layer: &UvLayer) -> Result<UvLayout> {
        let found = layer.data.len();
        if found == self.vertex_count() {
            Ok(UvLayout::PerVertex)
        } else if found == self.loop_count() {
            Ok(UvLayout::PerLoop)
        } else {
            Err(Error::UvLayerMismatch {
                mesh: self.name.clone(),
                layer: layer.name.clone(),
                vertices: self.vertex_count(),
                loops: self.loop_count(),
                found,
            })
        }
    }

    /// Check index references inside the mesh
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len();

        for (face_idx, polygon) in self.polygons.iter().enumerate() {
            if polygon.vertices.is_empty() {
                return Err(Error::invalid_data(format!(
                    "polygon {} of mesh '{}' has no vertices",
                    face_idx, self.name
                )));
            }
            for &index in &polygon.vertices {
                if index >= vertex_count {
                    return Err(Error::IndexOutOfRange {
                        what: format!("polygon {} vertex", face_idx),
                        index,
                        len: vertex_count,
                    });
                }
            }
        }

        let group_count = self.vertex_groups.len();
        for (vertex_idx, vertex) in self.vertices.iter().enumerate() {
            for membership in &vertex.groups {
                if membership.group >= group_count {
                    return Err(Error::IndexOutOfRange {
                        what: format!("vertex {} group", vertex_idx),
                        index: membership.group,
                        len: group_count,
                    });
                }
            }
        }

        Ok(())
    }
}

/// A single mesh vertex
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshVertex {
    /// Mesh-local position
    pub co: Vec3,
    /// Vertex group memberships
    #[serde(default)]
    pub groups: Vec<GroupWeight>,
}

impl MeshVertex {
    pub fn new(co: Vec3) -> Self {
        Self { co, groups: Vec::new() }
    }

    pub fn with_group(mut self, group: usize, weight: f64) -> Self {
        self.groups.push(GroupWeight { group, weight });
        self
    }
}

/// Membership of a vertex in a vertex group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    pub group: usize,
    pub weight: f64,
}

/// Polygon (not necessarily a triangle)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<usize>,
}

impl Polygon {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self { vertices }
    }
}

/// A UV layer, one coordinate per vertex or per face corner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UvLayer {
    #[serde(default)]
    pub name: String,
    pub data: Vec<Vec2>,
}

/// Indexing of a UV layer's coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UvLayout {
    /// `data[i]` belongs to vertex `i`
    #[default]
    PerVertex,
    /// Coordinates follow polygon corners, polygon by polygon
    PerLoop,
}
