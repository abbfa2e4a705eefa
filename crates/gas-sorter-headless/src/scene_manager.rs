use std::path::{Path, PathBuf};

use gas_sorter_core::command::CommandOutcome;
use gas_sorter_core::fixed::{Fixed64, Ticks};
use gas_sorter_core::session::ScanReport;

use crate::error::SceneError;
use crate::manifest::{SceneEntry, SceneManifest, load_manifest};
use crate::scene_builder::{ActiveScene, build_scene};
use crate::world::MessageLog;

/// Loads the manifest, loads/unloads scenes, drives ticks and answers
/// queries about the active scene.
pub struct SceneManager {
    scenes_dir: PathBuf,
    manifest: SceneManifest,
    active: Option<ActiveScene>,
}

impl SceneManager {
    /// Create a new SceneManager by loading the manifest from `scenes_dir`.
    pub fn new(scenes_dir: &Path) -> Result<Self, SceneError> {
        let manifest = load_manifest(scenes_dir)?;
        Ok(Self {
            scenes_dir: scenes_dir.to_path_buf(),
            manifest,
            active: None,
        })
    }

    pub fn title(&self) -> &str {
        &self.manifest.title
    }

    pub fn description(&self) -> &str {
        &self.manifest.description
    }

    /// All scene entries from the manifest.
    pub fn scenes(&self) -> &[SceneEntry] {
        &self.manifest.scenes
    }

    pub fn entry(&self, scene_id: &str) -> Result<&SceneEntry, SceneError> {
        self.manifest
            .scenes
            .iter()
            .find(|s| s.id == scene_id)
            .ok_or_else(|| SceneError::SceneNotFound {
                id: scene_id.to_string(),
            })
    }

    /// Directory holding the files of `scene_id`.
    pub fn scene_dir(&self, scene_id: &str) -> Result<PathBuf, SceneError> {
        Ok(self.scenes_dir.join(&self.entry(scene_id)?.path))
    }

    /// Load a scene by its manifest ID. Replaces any previously active scene.
    pub fn load_scene(&mut self, scene_id: &str) -> Result<(), SceneError> {
        let scene = build_scene(&self.scene_dir(scene_id)?)?;
        tracing::info!(scene = scene_id, "scene loaded");
        self.active = Some(scene);
        Ok(())
    }

    pub fn unload_scene(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Result<&ActiveScene, SceneError> {
        self.active.as_ref().ok_or(SceneError::NoActiveScene)
    }

    pub fn active_mut(&mut self) -> Result<&mut ActiveScene, SceneError> {
        self.active.as_mut().ok_or(SceneError::NoActiveScene)
    }

    /// Advance one tick. Returns the scan report if a scan ran.
    pub fn tick(&mut self) -> Result<Option<ScanReport>, SceneError> {
        Ok(self.active_mut()?.step())
    }

    /// Advance `n` ticks. Returns the reports of every scan that ran.
    pub fn tick_n(&mut self, n: u64) -> Result<Vec<ScanReport>, SceneError> {
        let scene = self.active_mut()?;
        Ok((0..n).filter_map(|_| scene.step()).collect())
    }

    pub fn current_tick(&self) -> Result<Ticks, SceneError> {
        Ok(self.active()?.tick)
    }

    /// Fill ratio of a named tank in the active scene.
    pub fn tank_ratio(&self, name: &str) -> Result<Fixed64, SceneError> {
        self.active()?.tank_ratio(name)
    }

    /// Offer a chat message to the active scene's command handler.
    pub fn send_chat(&mut self, message: &str) -> Result<CommandOutcome, SceneError> {
        Ok(self.active_mut()?.session.handle_chat_command(message))
    }

    /// Info panel text for the named sorter.
    pub fn custom_info(&self, sorter_name: &str) -> Result<String, SceneError> {
        let scene = self.active()?;
        let id = scene.block_id(sorter_name)?;
        let sorter = scene
            .world
            .sorter(id)
            .ok_or_else(|| SceneError::NameNotFound {
                name: sorter_name.to_string(),
            })?;
        Ok(scene.session.custom_info(&scene.world, sorter))
    }

    /// Messages the active scene has sent so far.
    pub fn messages(&self) -> Result<&MessageLog, SceneError> {
        Ok(&self.active()?.messages)
    }

    pub fn state_hash(&self) -> Result<u64, SceneError> {
        Ok(self.active()?.state_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SceneManager {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenes");
        SceneManager::new(&dir).unwrap()
    }

    #[test]
    fn queries_without_scene_fail() {
        let mut mgr = manager();
        assert!(matches!(mgr.tick(), Err(SceneError::NoActiveScene)));
        assert!(matches!(mgr.current_tick(), Err(SceneError::NoActiveScene)));
        assert!(matches!(mgr.tank_ratio("x"), Err(SceneError::NoActiveScene)));
    }

    #[test]
    fn unknown_scene_id() {
        let mut mgr = manager();
        let err = mgr.load_scene("no_such_scene").unwrap_err();
        assert!(matches!(err, SceneError::SceneNotFound { ref id } if id == "no_such_scene"));
    }

    #[test]
    fn load_tick_unload() {
        let mut mgr = manager();
        let first = mgr.scenes()[0].id.clone();
        mgr.load_scene(&first).unwrap();
        assert_eq!(mgr.current_tick().unwrap(), 0);
        mgr.tick_n(10).unwrap();
        assert_eq!(mgr.current_tick().unwrap(), 10);
        mgr.unload_scene();
        assert!(mgr.active().is_err());
    }
}
