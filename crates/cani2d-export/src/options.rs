//! Export configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExportResult;

/// Format version written to `exporter_version`
pub const EXPORTER_VERSION: [u32; 3] = [0, 0, 1];

/// cani2d export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Pretty-print the document
    pub pretty: bool,

    /// Write each bone's rest rotation as `rotation: [w, x, y, z]`
    pub emit_bone_rotation: bool,

    /// Mirror the tangent handles of location Y curves along with the value
    pub mirror_location_handles: bool,

    /// Version triple stamped into the document
    pub exporter_version: [u32; 3],
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            emit_bone_rotation: false,
            mirror_location_handles: true,
            exporter_version: EXPORTER_VERSION,
        }
    }
}

impl ExportOptions {
    /// Location Y handles keep their authored sign, as in files written by
    /// the 0.0.1 add-on.
    pub fn legacy() -> Self {
        Self {
            mirror_location_handles: false,
            ..Self::default()
        }
    }

    /// Load options from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> ExportResult<Self> {
        let file = std::fs::File::open(path)?;
        let options = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(options)
    }
}
