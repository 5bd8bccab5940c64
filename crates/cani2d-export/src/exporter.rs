//! cani2d exporter facade

use std::path::Path;

use cani2d_core::logging::instrument_stage;
use cani2d_core::ResultExt;
use cani2d_scene::{ExportTarget, Scene, Skeleton};
use tracing::info;

use crate::animation::{AnimationMerger, MergedTrack};
use crate::error::ExportResult;
use crate::geometry::extract_geometry;
use crate::options::ExportOptions;
use crate::report::{ExportReport, ExportWarning};
use crate::skeleton::{serialize_skeleton, ExportBone};
use crate::writer::{self, Cani2dDocument};

/// A finished export held in memory
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub document: Cani2dDocument,
    pub report: ExportReport,
}

/// cani2d exporter
pub struct Cani2dExporter {
    options: ExportOptions,
}

impl Default for Cani2dExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Cani2dExporter {
    /// Create a new exporter with default options
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    /// Create exporter with custom options
    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Run the whole pipeline on a scene snapshot
    ///
    /// Fails before producing anything if the scene has no exportable mesh,
    /// the mesh indexes out of range, or a strip references a missing action.
    pub fn export(&self, scene: &Scene) -> ExportResult<ExportOutput> {
        let target = scene.export_target()?;

        let geometry = instrument_stage("geometry", || {
            extract_geometry(target.object, target.mesh, target.uv_layer)
        })?;
        let bones = instrument_stage("skeleton", || self.bones(&target))?;
        let (tracks, warnings) = instrument_stage("animation", || self.animations(scene, &target))?;

        let document = Cani2dDocument::assemble(&geometry, &bones, &tracks, &self.options);

        let report = ExportReport {
            object: target.object.name.clone(),
            armature: target.armature.map(|a| a.object.name.clone()),
            vertices: geometry.vertex_count(),
            faces: geometry.face_count(),
            vertex_groups: geometry.group_names.len(),
            bones: bones.iter().map(ExportBone::subtree_len).sum(),
            animations: tracks.len(),
            warnings,
        };

        info!(
            object = %report.object,
            vertices = report.vertices,
            faces = report.faces,
            bones = report.bones,
            animations = report.animations,
            warnings = report.warnings.len(),
            "Export assembled"
        );

        Ok(ExportOutput { document, report })
    }

    /// Export and render as JSON text
    pub fn export_to_string(&self, scene: &Scene) -> ExportResult<(String, ExportReport)> {
        let output = self.export(scene)?;
        let text = writer::to_string(&output.document, self.options.pretty)?;
        Ok((text, output.report))
    }

    /// Export and write atomically to `path`
    pub fn export_to_file(&self, scene: &Scene, path: impl AsRef<Path>) -> ExportResult<ExportReport> {
        let path = path.as_ref();
        let output = self.export(scene)?;
        let bytes = writer::write_document(&output.document, path, self.options.pretty)?;

        info!(path = %path.display(), bytes, "Export written");
        Ok(output.report)
    }

    fn bones(&self, target: &ExportTarget<'_>) -> ExportResult<Vec<ExportBone>> {
        let Some(armature) = target.armature else {
            return Ok(Vec::new());
        };

        let skeleton = Skeleton::from_armature(armature.data)
            .with_context(|| format!("building skeleton of '{}'", armature.object.name))?;
        Ok(serialize_skeleton(&skeleton, armature.object.location))
    }

    fn animations(
        &self,
        scene: &Scene,
        target: &ExportTarget<'_>,
    ) -> ExportResult<(Vec<MergedTrack>, Vec<ExportWarning>)> {
        let Some(animation) = target.armature.and_then(|a| a.data.animation_data.as_ref()) else {
            return Ok((Vec::new(), Vec::new()));
        };

        let mut merger = AnimationMerger::new(scene, self.options.mirror_location_handles);
        let tracks = merger.merge_all(animation)?;
        Ok((tracks, merger.into_warnings()))
    }
}
