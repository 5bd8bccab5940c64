//! cani2d-scene
//!
//! Read-only snapshot of an authored scene: one or more mesh objects,
//! optional armatures with their bone trees, and non-linear animation
//! (tracks of strips referencing actions).
//!
//! # Example
//!
//! ```rust,ignore
//! use cani2d_scene::{JsonSceneReader, SceneReader};
//!
//! let scene = JsonSceneReader::new().read_file("scene.json".as_ref())?;
//! let target = scene.export_target()?;
//! println!("exporting {} ({} vertices)", target.object.name, target.mesh.vertex_count());
//! ```

pub mod animation;
pub mod armature;
pub mod mesh;
pub mod reader;
pub mod scene;
pub mod traits;

pub use animation::{Action, ActionGroup, AnimationData, ChannelKind, FCurve, Keyframe, NlaStrip, NlaTrack};
pub use armature::{ArmatureData, Bone, BoneData, Skeleton};
pub use mesh::{GroupWeight, MeshData, MeshVertex, Polygon, UvLayer, UvLayout};
pub use reader::JsonSceneReader;
pub use scene::{ArmatureTarget, ExportTarget, ObjectData, Scene, SceneObject};
pub use traits::{ReadOptions, SceneReader};
