//! Skeleton serialization: parent-relative bone heads on the Y-down plane

use cani2d_core::{Quat, Vec3};
use cani2d_scene::{Bone, Skeleton};
use tracing::debug;

/// A bone ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBone {
    pub name: String,
    /// Offset from the parent's head, or the absolute head for a root, Y mirrored
    pub head: [f64; 2],
    /// Rest rotation with the Y-mirror sign correction applied
    pub rotation: Quat,
    pub children: Vec<ExportBone>,
}

impl ExportBone {
    /// Number of bones in this subtree, including itself
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(ExportBone::subtree_len).sum::<usize>()
    }
}

/// Walk every root depth-first, computing heads relative to the parent
///
/// Root heads are armature-local plus `armature_location`.
pub fn serialize_skeleton(skeleton: &Skeleton, armature_location: Vec3) -> Vec<ExportBone> {
    let bones: Vec<ExportBone> = skeleton
        .roots
        .iter()
        .map(|root| serialize_bone(root, root.head_local + armature_location))
        .collect();

    debug!(
        roots = bones.len(),
        bones = bones.iter().map(ExportBone::subtree_len).sum::<usize>(),
        "Skeleton serialized"
    );

    bones
}

fn serialize_bone(bone: &Bone, offset: Vec3) -> ExportBone {
    ExportBone {
        name: bone.name.clone(),
        head: offset.to_plane(),
        rotation: mirror_rotation(bone.rest_rotation),
        children: bone
            .children
            .iter()
            .map(|child| serialize_bone(child, child.head_local - bone.head_local))
            .collect(),
    }
}

/// Same heuristic as quaternion curves: negate components 0 and 1 (w, x)
pub(crate) fn mirror_rotation(q: Quat) -> Quat {
    Quat::new(-q.w, -q.x, q.y, q.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cani2d_scene::{ArmatureData, BoneData};

    fn skeleton(bones: Vec<BoneData>) -> Skeleton {
        Skeleton::from_armature(&ArmatureData { bones, animation_data: None }).unwrap()
    }

    #[test]
    fn test_root_head_includes_armature_location() {
        let skel = skeleton(vec![BoneData::new("root", Vec3::new(1.0, 2.0, 3.0))]);

        let bones = serialize_skeleton(&skel, Vec3::new(10.0, 20.0, 0.0));
        assert_eq!(bones.len(), 1);
        assert_eq!(bones[0].head, [11.0, -22.0]);
    }

    #[test]
    fn test_child_head_relative_to_parent() {
        let skel = skeleton(vec![
            BoneData::new("root", Vec3::new(1.0, 1.0, 0.0)),
            BoneData::new("upper", Vec3::new(1.0, 4.0, 0.0)).with_parent("root"),
            BoneData::new("lower", Vec3::new(3.0, 6.0, 0.0)).with_parent("upper"),
        ]);

        let bones = serialize_skeleton(&skel, Vec3::new(100.0, 100.0, 0.0));
        let upper = &bones[0].children[0];
        assert_eq!(upper.head, [0.0, -3.0]);
        assert_eq!(upper.children[0].head, [2.0, -2.0]);
        assert_eq!(bones[0].subtree_len(), 3);
    }

    #[test]
    fn test_rotation_sign_correction() {
        let skel = skeleton(vec![BoneData::new("root", Vec3::ZERO)]);

        let bones = serialize_skeleton(&skel, Vec3::ZERO);
        assert_eq!(bones[0].rotation, Quat::new(-1.0, -0.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_skeleton() {
        assert!(serialize_skeleton(&Skeleton::default(), Vec3::ONE).is_empty());
    }
}
