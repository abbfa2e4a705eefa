use serde::Deserialize;
use std::path::Path;

use crate::error::SceneError;

/// Top-level manifest listing the bundled scenes.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneManifest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scenes: Vec<SceneEntry>,
}

/// An entry in the manifest pointing to a scene directory.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Relative path from the scenes directory to the scene directory.
    pub path: String,
    /// Ticks the runner should advance this scene by.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_ticks() -> u64 {
    300
}

/// Load the scene manifest from `manifest.ron` in `scenes_dir`.
pub fn load_manifest(scenes_dir: &Path) -> Result<SceneManifest, SceneError> {
    let path = scenes_dir.join("manifest.ron");
    let content = std::fs::read_to_string(&path)?;
    ron::from_str(&content).map_err(|e| SceneError::Parse {
        file: path,
        detail: e.to_string(),
    })
}
