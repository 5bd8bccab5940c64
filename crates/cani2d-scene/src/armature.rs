//! Armature data and the owned bone tree built from it

use std::collections::HashMap;

use cani2d_core::{Error, Quat, Result, Vec3};
use serde::{Deserialize, Serialize};

use crate::animation::AnimationData;

/// Armature datablock of an armature object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmatureData {
    /// Bones in the tool's native order; a bone's children keep this order
    #[serde(default)]
    pub bones: Vec<BoneData>,
    /// Non-linear animation attached to the armature object
    #[serde(default)]
    pub animation_data: Option<AnimationData>,
}

/// A bone as stored in the snapshot (flat, parent by name)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneData {
    /// Bone name
    pub name: String,
    /// Parent bone name (None for root bones)
    #[serde(default)]
    pub parent: Option<String>,
    /// Head location in armature space
    pub head_local: Vec3,
    /// Rest rotation matrix (`m[row][col]`)
    #[serde(default = "identity3")]
    pub matrix: [[f64; 3]; 3],
}

impl BoneData {
    /// Create a root bone with identity rest rotation
    pub fn new(name: impl Into<String>, head_local: Vec3) -> Self {
        Self {
            name: name.into(),
            parent: None,
            head_local,
            matrix: identity3(),
        }
    }

    /// Set the parent bone name
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

fn identity3() -> [[f64; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

/// Owned bone tree; every node owns its children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    /// Bones without a parent, in native order
    pub roots: Vec<Bone>,
}

/// A node of the bone tree
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Head location in armature space
    pub head_local: Vec3,
    /// Rest rotation read from the bone matrix
    pub rest_rotation: Quat,
    /// Children in native order
    pub children: Vec<Bone>,
}

impl Skeleton {
    /// Build the tree from the flat bone list
    ///
    /// Fails on duplicate names, unknown parents and parent cycles.
    pub fn from_armature(armature: &ArmatureData) -> Result<Self> {
        let bones = &armature.bones;

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(bones.len());
        for (idx, bone) in bones.iter().enumerate() {
            if index.insert(bone.name.as_str(), idx).is_some() {
                return Err(Error::invalid_data(format!("duplicate bone name '{}'", bone.name)));
            }
        }

        let mut parents: Vec<Option<usize>> = Vec::with_capacity(bones.len());
        for bone in bones {
            let parent = match &bone.parent {
                Some(name) => Some(*index.get(name.as_str()).ok_or_else(|| Error::UnknownBone {
                    bone: bone.name.clone(),
                    parent: name.clone(),
                })?),
                None => None,
            };
            parents.push(parent);
        }

        // A chain longer than the bone count must revisit a bone.
        for (idx, bone) in bones.iter().enumerate() {
            let mut current = parents[idx];
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if parent == idx || steps > bones.len() {
                    return Err(Error::BoneCycle { bone: bone.name.clone() });
                }
                current = parents[parent];
            }
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); bones.len()];
        let mut roots = Vec::new();
        for (idx, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(idx),
                None => roots.push(idx),
            }
        }

        let roots = roots
            .into_iter()
            .map(|idx| build_node(bones, &children, idx))
            .collect();

        Ok(Self { roots })
    }

    /// Get bone count
    pub fn bone_count(&self) -> usize {
        self.iter().count()
    }

    /// Depth-first pre-order iteration over all bones
    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        let mut stack: Vec<&Bone> = self.roots.iter().rev().collect();
        std::iter::from_fn(move || {
            let bone = stack.pop()?;
            stack.extend(bone.children.iter().rev());
            Some(bone)
        })
    }

    /// Get all bone names in pre-order
    pub fn bone_names(&self) -> Vec<&str> {
        self.iter().map(|b| b.name.as_str()).collect()
    }
}

fn build_node(bones: &[BoneData], children: &[Vec<usize>], idx: usize) -> Bone {
    let data = &bones[idx];
    Bone {
        name: data.name.clone(),
        head_local: data.head_local,
        rest_rotation: Quat::from_rotation_matrix(data.matrix),
        children: children[idx]
            .iter()
            .map(|&child| build_node(bones, children, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armature(bones: Vec<BoneData>) -> ArmatureData {
        ArmatureData { bones, animation_data: None }
    }

    #[test]
    fn test_tree_keeps_native_child_order() {
        let arm = armature(vec![
            BoneData::new("root", Vec3::ZERO),
            BoneData::new("zeta", Vec3::new(1.0, 0.0, 0.0)).with_parent("root"),
            BoneData::new("alpha", Vec3::new(0.0, 1.0, 0.0)).with_parent("root"),
            BoneData::new("tip", Vec3::new(0.0, 2.0, 0.0)).with_parent("alpha"),
        ]);

        let skeleton = Skeleton::from_armature(&arm).unwrap();
        assert_eq!(skeleton.roots.len(), 1);
        assert_eq!(skeleton.bone_names(), vec!["root", "zeta", "alpha", "tip"]);
        assert_eq!(skeleton.bone_count(), 4);
        assert!(skeleton.iter().filter(|b| b.name == "tip").all(|b| b.children.is_empty()));
    }

    #[test]
    fn test_multiple_roots() {
        let arm = armature(vec![
            BoneData::new("a", Vec3::ZERO),
            BoneData::new("b", Vec3::ONE),
            BoneData::new("a1", Vec3::ONE).with_parent("a"),
        ]);

        let skeleton = Skeleton::from_armature(&arm).unwrap();
        let roots: Vec<_> = skeleton.roots.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(roots, vec!["a", "b"]);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let arm = armature(vec![
            BoneData::new("child", Vec3::ONE).with_parent("root"),
            BoneData::new("root", Vec3::ZERO),
        ]);

        let skeleton = Skeleton::from_armature(&arm).unwrap();
        assert_eq!(skeleton.bone_names(), vec!["root", "child"]);
    }

    #[test]
    fn test_unknown_parent() {
        let arm = armature(vec![BoneData::new("hand", Vec3::ZERO).with_parent("arm")]);

        match Skeleton::from_armature(&arm) {
            Err(Error::UnknownBone { bone, parent }) => {
                assert_eq!(bone, "hand");
                assert_eq!(parent, "arm");
            }
            other => panic!("Expected UnknownBone, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_detected() {
        let arm = armature(vec![
            BoneData::new("root", Vec3::ZERO),
            BoneData::new("a", Vec3::ZERO).with_parent("b"),
            BoneData::new("b", Vec3::ZERO).with_parent("a"),
        ]);

        assert!(matches!(Skeleton::from_armature(&arm), Err(Error::BoneCycle { .. })));
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let arm = armature(vec![BoneData::new("loop", Vec3::ZERO).with_parent("loop")]);
        assert!(matches!(Skeleton::from_armature(&arm), Err(Error::BoneCycle { .. })));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let arm = armature(vec![BoneData::new("x", Vec3::ZERO), BoneData::new("x", Vec3::ONE)]);
        assert!(matches!(Skeleton::from_armature(&arm), Err(Error::InvalidData { .. })));
    }
}
