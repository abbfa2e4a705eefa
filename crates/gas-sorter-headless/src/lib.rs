//! Headless host for the Gas Sorter core.
//!
//! Runs gas sorter scans outside the game: an in-memory [`world::MemoryWorld`]
//! stands in for the host's grids and blocks, scenes are described in RON
//! files, and a [`scene_manager::SceneManager`] steps them tick by tick.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gas_sorter_headless::scene_manager::SceneManager;
//!
//! let mut mgr = SceneManager::new("scenes/".as_ref())?;
//! mgr.load_scene("oxygen_valve")?;
//! mgr.tick_n(300)?;
//! let ratio = mgr.tank_ratio("o2_out")?;
//! ```

pub mod error;
pub mod loader;
pub mod manifest;
pub mod scene_builder;
pub mod scene_manager;
pub mod scene_schema;
pub mod world;

pub use error::SceneError;
pub use loader::{DataLoadError, load_config};
pub use manifest::{SceneEntry, SceneManifest};
pub use scene_builder::{ActiveScene, build_scene, build_scene_from_data};
pub use scene_manager::SceneManager;
pub use scene_schema::SceneData;
pub use world::{MemoryWorld, MessageLog, WorldError};
