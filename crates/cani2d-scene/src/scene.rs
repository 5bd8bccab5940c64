//! The scene snapshot and export-target selection

use std::collections::HashSet;

use cani2d_core::{Error, Mat4x4, Result, ResultExt, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::Action;
use crate::armature::{ArmatureData, Skeleton};
use crate::mesh::{MeshData, UvLayer, UvLayout};

/// Read-only snapshot of the authoring tool's scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Objects in scene order
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// Actions referenced by NLA strips
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// An object of the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// Parent object name
    #[serde(default)]
    pub parent: Option<String>,
    /// Whether the object is part of the user's selection
    #[serde(default)]
    pub selected: bool,
    /// Object location property (relative to parent)
    #[serde(default)]
    pub location: Vec3,
    /// World transform
    #[serde(default)]
    pub world_matrix: Mat4x4,
    pub data: ObjectData,
}

/// Datablock carried by an object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ObjectData {
    Mesh(MeshData),
    Armature(ArmatureData),
    Empty,
}

impl SceneObject {
    /// Create an unparented, unselected object at the origin
    pub fn new(name: impl Into<String>, data: ObjectData) -> Self {
        Self {
            name: name.into(),
            parent: None,
            selected: false,
            location: Vec3::ZERO,
            world_matrix: Mat4x4::IDENTITY,
            data,
        }
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn armature(&self) -> Option<&ArmatureData> {
        match &self.data {
            ObjectData::Armature(armature) => Some(armature),
            _ => None,
        }
    }

    /// Translation part of the world transform
    pub fn world_translation(&self) -> Vec3 {
        self.world_matrix.translation()
    }

    pub fn type_name(&self) -> &'static str {
        match self.data {
            ObjectData::Mesh(_) => "mesh",
            ObjectData::Armature(_) => "armature",
            ObjectData::Empty => "empty",
        }
    }
}

/// The mesh (and optional armature) chosen for export
#[derive(Debug, Clone, Copy)]
pub struct ExportTarget<'a> {
    pub object: &'a SceneObject,
    pub mesh: &'a MeshData,
    /// First UV layer of the mesh
    pub uv_layer: &'a UvLayer,
    pub uv_layout: UvLayout,
    pub armature: Option<ArmatureTarget<'a>>,
}

/// The armature object driving the exported mesh
#[derive(Debug, Clone, Copy)]
pub struct ArmatureTarget<'a> {
    pub object: &'a SceneObject,
    pub data: &'a ArmatureData,
}

impl Scene {
    /// Find object by name
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Objects parented to `name`, in scene order
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SceneObject> + 'a {
        self.objects
            .iter()
            .filter(move |o| o.parent.as_deref() == Some(name))
    }

    /// Currently selected objects
    pub fn selected_objects(&self) -> Vec<&SceneObject> {
        self.objects.iter().filter(|o| o.selected).collect()
    }

    /// Find action by name
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Check references across the whole snapshot
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::with_capacity(self.objects.len());
        for object in &self.objects {
            if !names.insert(object.name.as_str()) {
                return Err(Error::invalid_data(format!("duplicate object name '{}'", object.name)));
            }
        }

        for object in &self.objects {
            if let Some(parent) = &object.parent {
                if !names.contains(parent.as_str()) {
                    return Err(Error::UnknownObject { name: parent.clone() });
                }
            }

            match &object.data {
                ObjectData::Mesh(mesh) => {
                    mesh.validate()
                        .with_context(|| format!("validating mesh object '{}'", object.name))?;
                }
                ObjectData::Armature(armature) => {
                    Skeleton::from_armature(armature)
                        .with_context(|| format!("validating armature object '{}'", object.name))?;
                    self.validate_strips(armature)?;
                }
                ObjectData::Empty => {}
            }
        }

        debug!(objects = self.objects.len(), actions = self.actions.len(), "Scene validated");
        Ok(())
    }

    fn validate_strips(&self, armature: &ArmatureData) -> Result<()> {
        let Some(animation) = &armature.animation_data else {
            return Ok(());
        };

        for track in &animation.nla_tracks {
            for strip in &track.strips {
                if self.action(&strip.action).is_none() {
                    return Err(Error::UnknownAction {
                        track: track.name.clone(),
                        strip: strip.name.clone(),
                        action: strip.action.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Pick the mesh to export and the armature driving it
    ///
    /// 1. a single selected mesh, with its armature parent if any
    /// 2. a single selected armature that has exactly one child mesh
    /// 3. the first mesh in scene order, with its armature parent if any
    pub fn export_target(&self) -> Result<ExportTarget<'_>> {
        let object = self
            .target_from_selection()
            .or_else(|| self.objects.iter().find(|o| o.mesh().is_some()))
            .ok_or_else(|| Error::no_mesh("scene contains no mesh object"))?;

        let mesh = object
            .mesh()
            .ok_or_else(|| Error::no_mesh(format!("object '{}' is not a mesh", object.name)))?;

        let uv_layer = mesh.active_uv_layer().ok_or_else(|| {
            Error::no_mesh(format!("mesh object '{}' has no UV layer", object.name))
        })?;
        let uv_layout = mesh
            .uv_layout(uv_layer)
            .with_context(|| format!("mesh object '{}'", object.name))?;

        let armature = object
            .parent
            .as_deref()
            .and_then(|name| self.object(name))
            .and_then(|parent| {
                parent
                    .armature()
                    .map(|data| ArmatureTarget { object: parent, data })
            });

        debug!(
            mesh = %object.name,
            uv_layout = ?uv_layout,
            armature = armature.map(|a| a.object.name.as_str()).unwrap_or("-"),
            "Selected export target"
        );

        Ok(ExportTarget { object, mesh, uv_layer, uv_layout, armature })
    }

    fn target_from_selection(&self) -> Option<&SceneObject> {
        let selected = self.selected_objects();
        let [only] = selected.as_slice() else {
            return None;
        };

        match &only.data {
            ObjectData::Mesh(_) => Some(*only),
            ObjectData::Armature(_) => {
                let children: Vec<_> = self.children_of(&only.name).collect();
                match children.as_slice() {
                    [child] if child.mesh().is_some() => Some(*child),
                    _ => None,
                }
            }
            ObjectData::Empty => None,
        }
    }
}
