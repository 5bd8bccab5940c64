//! Export errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] cani2d_core::Error),

    #[error("Failed to move export into place at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// True when no mesh in the scene could be exported
    pub fn is_no_exportable_mesh(&self) -> bool {
        matches!(
            self,
            ExportError::Scene(e) if matches!(e.root(), cani2d_core::Error::NoExportableMesh { .. })
        )
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
