use std::path::PathBuf;

use gas_sorter_core::config::ConfigError;
use gas_sorter_core::host::HostError;

use crate::loader::DataLoadError;
use crate::world::WorldError;

/// Errors that can occur while loading or running a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// No scene is currently loaded.
    #[error("no scene is currently loaded")]
    NoActiveScene,

    /// The requested scene was not found in the manifest.
    #[error("scene '{id}' not found in manifest")]
    SceneNotFound { id: String },

    /// A block or grid name was not found in the active scene.
    #[error("'{name}' not found in scene")]
    NameNotFound { name: String },

    /// The named block exists but is not a tank.
    #[error("'{name}' is not a tank")]
    NotATank { name: String },

    /// Two grids or two blocks share a name.
    #[error("duplicate name '{name}' in scene")]
    DuplicateName { name: String },

    /// A tank's starting ratio is NaN, infinite or outside `[0, 1]`.
    #[error("tank '{name}' has fill ratio {ratio}, expected a value in [0, 1]")]
    InvalidRatio { name: String, ratio: f64 },

    /// Failed to load a scene or config file.
    #[error("data load error in {dir}: {source}")]
    DataLoad {
        dir: PathBuf,
        source: DataLoadError,
    },

    /// Failed to parse the manifest.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The scene's config failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A block could not be placed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// The in-memory host rejected a write.
    #[error(transparent)]
    Host(#[from] HostError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
