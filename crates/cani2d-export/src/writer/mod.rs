//! cani2d document writer
//!
//! Serializes a [`Cani2dDocument`] and writes it atomically: the bytes go
//! to a temporary file next to the destination which is renamed over it
//! once fully flushed.

pub mod document;

pub use document::{AnimationRecord, BoneRecord, Cani2dDocument, CurveRecord, FaceRecord, NamedEntries};

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ExportError, ExportResult};

/// Render the document as JSON text
pub fn to_string(document: &Cani2dDocument, pretty: bool) -> ExportResult<String> {
    let text = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(text)
}

/// Write the document to `path`, replacing any existing file
///
/// Nothing is left at `path` if serialization or any write fails.
pub fn write_document(document: &Cani2dDocument, path: &Path, pretty: bool) -> ExportResult<u64> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        if pretty {
            serde_json::to_writer_pretty(&mut writer, document)?;
        } else {
            serde_json::to_writer(&mut writer, document)?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    let file = temp.persist(path).map_err(|e| ExportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    let bytes = file.metadata()?.len();

    debug!(path = %path.display(), bytes, "Document written");
    Ok(bytes)
}
