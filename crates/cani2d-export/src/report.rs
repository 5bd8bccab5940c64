//! Export summary and non-fatal warnings

use std::fmt;

use serde::Serialize;

/// Something that was skipped without aborting the export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportWarning {
    /// An F-curve whose target is not location, rotation_quaternion or scale
    UnsupportedChannel {
        track: String,
        strip: String,
        bone: String,
        data_path: String,
    },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::UnsupportedChannel { track, strip, bone, data_path } => write!(
                f,
                "unsupported curve '{data_path}' on bone '{bone}' (track '{track}', strip '{strip}')"
            ),
        }
    }
}

/// What an export produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    /// Name of the exported mesh object
    pub object: String,
    /// Armature object the bones came from, if any
    pub armature: Option<String>,
    pub vertices: usize,
    pub faces: usize,
    pub vertex_groups: usize,
    pub bones: usize,
    pub animations: usize,
    pub warnings: Vec<ExportWarning>,
}

impl ExportReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display_and_json() {
        let warning = ExportWarning::UnsupportedChannel {
            track: "walk".into(),
            strip: "step".into(),
            bone: "arm".into(),
            data_path: "rotation_euler".into(),
        };

        assert!(warning.to_string().contains("rotation_euler"));

        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "unsupported_channel");
        assert_eq!(json["bone"], "arm");
    }
}
