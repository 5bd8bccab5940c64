//! Unified error handling for cani2d
//!
//! This module provides the error type shared by scene ingestion and the
//! export pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all cani2d operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ==================== Snapshot Errors ====================

    /// Snapshot could not be decoded
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    /// An index points outside the collection it refers to
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: String,
        index: usize,
        len: usize,
    },

    /// Object parent names an object that does not exist
    #[error("Unknown object: {name}")]
    UnknownObject {
        name: String,
    },

    // ==================== Export Target Errors ====================

    /// No mesh that can be exported was found in the scene
    #[error("No exportable mesh: {reason}")]
    NoExportableMesh {
        reason: String,
    },

    /// First UV layer matches neither the vertex count nor the face-corner count
    #[error(
        "UV layer '{layer}' of mesh '{mesh}' has {found} coordinates, expected {vertices} (per vertex) or {loops} (per face corner)"
    )]
    UvLayerMismatch {
        mesh: String,
        layer: String,
        vertices: usize,
        loops: usize,
        found: usize,
    },

    // ==================== Armature Errors ====================

    /// Bone parent names a bone that does not exist
    #[error("Bone '{bone}' references unknown parent '{parent}'")]
    UnknownBone {
        bone: String,
        parent: String,
    },

    /// Bone parent chain loops back on itself
    #[error("Bone hierarchy contains a cycle through '{bone}'")]
    BoneCycle {
        bone: String,
    },

    /// Strip references an action that does not exist
    #[error("Strip '{strip}' on track '{track}' references unknown action '{action}'")]
    UnknownAction {
        track: String,
        strip: String,
        action: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create a no-exportable-mesh error
    pub fn no_mesh(reason: impl Into<String>) -> Self {
        Error::NoExportableMesh {
            reason: reason.into(),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the error describes a malformed scene snapshot
    pub fn is_scene_error(&self) -> bool {
        matches!(
            self.root(),
            Error::Serialization { .. }
                | Error::InvalidData { .. }
                | Error::IndexOutOfRange { .. }
                | Error::UnknownObject { .. }
                | Error::NoExportableMesh { .. }
                | Error::UvLayerMismatch { .. }
                | Error::UnknownBone { .. }
                | Error::BoneCycle { .. }
                | Error::UnknownAction { .. }
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
