//! cani2d Export Pipeline
//!
//! Turns a scene snapshot into a cani2d document:
//! - geometry (faces, vertices, UVs, vertex groups)
//! - skeleton (bone tree with parent-relative heads)
//! - animation (NLA tracks merged into per-bone curves)
//! - writer (fixed document layout, atomic file write)

pub mod animation;
pub mod error;
pub mod exporter;
pub mod geometry;
pub mod options;
pub mod report;
pub mod skeleton;
pub mod writer;

pub use animation::{AnimationMerger, CurveType, ExportKey, MergedTrack};
pub use error::{ExportError, ExportResult};
pub use exporter::{Cani2dExporter, ExportOutput};
pub use geometry::{extract_geometry, Geometry};
pub use options::{ExportOptions, EXPORTER_VERSION};
pub use report::{ExportReport, ExportWarning};
pub use skeleton::{serialize_skeleton, ExportBone};
pub use writer::Cani2dDocument;
