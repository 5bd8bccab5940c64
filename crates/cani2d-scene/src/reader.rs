//! JSON scene snapshot reader

use std::io::Read;

use cani2d_core::{Error, Result};
use tracing::info;

use crate::scene::Scene;
use crate::traits::SceneReader;

/// Reads snapshots dumped by the authoring tool as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSceneReader;

impl JsonSceneReader {
    pub fn new() -> Self {
        Self
    }

    /// Decode and validate a snapshot held in memory
    pub fn read_str(&self, json: &str) -> Result<Scene> {
        self.read(json.as_bytes())
    }
}

impl SceneReader for JsonSceneReader {
    fn name(&self) -> &str {
        "JSON Scene Reader"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn decode<R: Read>(&self, reader: R) -> Result<Scene> {
        let scene: Scene = serde_json::from_reader(reader).map_err(|e| match e.classify() {
            serde_json::error::Category::Io => Error::Io(e.into()),
            _ => Error::Serialization { message: e.to_string() },
        })?;

        info!(
            reader = %self.name(),
            objects = scene.objects.len(),
            actions = scene.actions.len(),
            "Scene decoded"
        );

        Ok(scene)
    }
}
