//! Interface through which scene snapshots enter the exporter.
//!
//! The authoring tool is an external collaborator; any source that can
//! produce a [`Scene`] implements [`SceneReader`].

use std::io::Read;
use std::path::Path;

use cani2d_core::{Error, Result, ResultExt};

use crate::scene::Scene;

/// Configuration options for reading a snapshot
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Run [`Scene::validate`] after decoding
    pub validate: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

/// Core trait for all scene snapshot readers
pub trait SceneReader {
    /// Returns a human-readable name for this reader
    fn name(&self) -> &str;

    /// Returns the file extensions this reader handles (e.g., ["json"])
    fn extensions(&self) -> &[&str];

    /// Decode a snapshot without validating it
    fn decode<R: Read>(&self, reader: R) -> Result<Scene>;

    /// Read from a reader with default options
    fn read<R: Read>(&self, reader: R) -> Result<Scene> {
        self.read_with_options(reader, &ReadOptions::default())
    }

    /// Read from a reader with custom options
    fn read_with_options<R: Read>(&self, reader: R, options: &ReadOptions) -> Result<Scene> {
        let scene = self.decode(reader)?;
        if options.validate {
            scene.validate()?;
        }
        Ok(scene)
    }

    /// Read from a file path
    fn read_file(&self, path: &Path) -> Result<Scene> {
        self.read_file_with_options(path, &ReadOptions::default())
    }

    /// Read from a file path with options
    fn read_file_with_options(&self, path: &Path, options: &ReadOptions) -> Result<Scene> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        let reader = std::io::BufReader::new(file);
        self.read_with_options(reader, options)
            .with_context(|| format!("reading scene {}", path.display()))
    }

    /// Check if this reader can handle the given file
    fn can_read(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions().iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}
