use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

use gas_sorter_core::block::{SorterBlock, TankBlock};
use gas_sorter_core::config::GasSorterConfig;
use gas_sorter_core::fixed::{Fixed64, Ticks, f64_to_fixed64};
use gas_sorter_core::gas_control::set_gas_control_enabled;
use gas_sorter_core::host::World;
use gas_sorter_core::id::{BlockId, GridId};
use gas_sorter_core::session::{GasSorterSession, ScanReport};

use crate::error::SceneError;
use crate::loader::{deserialize_file, load_config_in_dir, require_data_file};
use crate::scene_schema::{SceneData, cell, parse_filter};
use crate::world::{MemoryWorld, MessageLog};

/// A fully constructed scene ready for simulation and inspection.
pub struct ActiveScene {
    pub world: MemoryWorld,
    pub session: GasSorterSession,
    pub messages: MessageLog,
    pub scene_data: SceneData,
    pub grid_names: HashMap<String, GridId>,
    pub block_names: HashMap<String, BlockId>,
    pub tick: Ticks,
    pub last_report: Option<ScanReport>,
}

impl ActiveScene {
    /// Advance one tick. Returns the scan report if a scan ran.
    pub fn step(&mut self) -> Option<ScanReport> {
        self.tick += 1;
        let report = self
            .session
            .on_tick(self.tick, &mut self.world, &mut self.messages)?;
        self.last_report = Some(report.clone());
        Some(report)
    }

    pub fn block_id(&self, name: &str) -> Result<BlockId, SceneError> {
        self.block_names
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::NameNotFound {
                name: name.to_string(),
            })
    }

    /// Fill ratio of the tank called `name` in the scene file.
    pub fn tank_ratio(&self, name: &str) -> Result<Fixed64, SceneError> {
        let id = self.block_id(name)?;
        self.world
            .fill_ratio(id)
            .ok_or_else(|| SceneError::NotATank {
                name: name.to_string(),
            })
    }

    /// Deterministic hash over the tick, every named tank's ratio and the
    /// chat output.
    pub fn state_hash(&self) -> u64 {
        let mut names: Vec<&String> = self.block_names.keys().collect();
        names.sort();

        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for name in names {
            name.hash(&mut hasher);
            if let Some(ratio) = self.world.fill_ratio(self.block_names[name]) {
                ratio.to_bits().hash(&mut hasher);
            }
        }
        for (channel, text) in self.messages.messages() {
            channel.prefix().hash(&mut hasher);
            text.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Build an active scene from a scene directory.
///
/// Reads `scene.{ron,toml,json}` and, if present, `config.{ron,toml,json}`.
pub fn build_scene(scene_dir: &Path) -> Result<ActiveScene, SceneError> {
    let data_error = |source| SceneError::DataLoad {
        dir: scene_dir.to_path_buf(),
        source,
    };
    let scene_path = require_data_file(scene_dir, "scene").map_err(data_error)?;
    let data: SceneData = deserialize_file(&scene_path).map_err(data_error)?;
    let config = load_config_in_dir(scene_dir).map_err(data_error)?;
    build_scene_from_data(data, config)
}

/// Build an active scene from already-parsed data.
pub fn build_scene_from_data(
    data: SceneData,
    config: GasSorterConfig,
) -> Result<ActiveScene, SceneError> {
    let mut session = GasSorterSession::new(config)?;
    let mut world = MemoryWorld::new();
    world.set_authoritative(data.authoritative);

    let mut grid_names = HashMap::new();
    let mut block_names = HashMap::new();

    for grid_data in &data.grids {
        let grid = world.add_grid();
        claim_name(&mut grid_names, &grid_data.name, grid)?;

        for tank in &grid_data.tanks {
            if !(0.0..=1.0).contains(&tank.ratio) {
                return Err(SceneError::InvalidRatio {
                    name: tank.name.clone(),
                    ratio: tank.ratio,
                });
            }
            let id = world.place_tank(
                grid,
                cell(tank.position),
                TankBlock {
                    id: BlockId(0),
                    fill_ratio: f64_to_fixed64(tank.ratio),
                    subtype: tank.subtype.clone(),
                    display_name: tank.display_name.clone(),
                },
            )?;
            claim_name(&mut block_names, &tank.name, id)?;
        }

        for block in &grid_data.blocks {
            let id = world.place_block(grid, cell(block.position), &block.display_name)?;
            claim_name(&mut block_names, &block.name, id)?;
        }

        for sorter in &grid_data.sorters {
            let id = world.place_sorter(
                grid,
                SorterBlock {
                    id: BlockId(0),
                    position: cell(sorter.position),
                    forward: sorter.facing,
                    enabled: sorter.enabled,
                    working: sorter.working,
                    functional: sorter.functional,
                    filters: sorter.filters.iter().map(|f| parse_filter(f)).collect(),
                    custom_name: sorter.custom_name.clone(),
                    display_name: "Conveyor Sorter".to_string(),
                },
            )?;
            claim_name(&mut block_names, &sorter.name, id)?;

            if let Some(text) = &sorter.custom_data {
                world.set_custom_data(id, text.clone())?;
            }
            if sorter.gas_control {
                set_gas_control_enabled(&mut world, id, true)?;
            }
        }
    }

    session.set_debug_enabled(data.debug);
    tracing::debug!(
        scene = %data.name,
        grids = world.grid_count(),
        blocks = world.block_count(),
        "scene built"
    );

    Ok(ActiveScene {
        world,
        session,
        messages: MessageLog::new(),
        scene_data: data,
        grid_names,
        block_names,
        tick: 0,
        last_report: None,
    })
}

fn claim_name<V>(names: &mut HashMap<String, V>, name: &str, value: V) -> Result<(), SceneError> {
    if names.contains_key(name) {
        return Err(SceneError::DuplicateName {
            name: name.to_string(),
        });
    }
    names.insert(name.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_sorter_core::gas_control::is_gas_control_enabled;
    use gas_sorter_core::host::Channel;
    use gas_sorter_core::test_utils::assert_ratio_near;

    fn parse(input: &str) -> SceneData {
        ron::from_str(input).unwrap()
    }

    fn valve_scene() -> SceneData {
        parse(
            r#"(
                name: "valve",
                grids: [(
                    name: "ship",
                    sorters: [(name: "valve", position: (0, 0, 0), facing: Left, filters: ["OxygenGasItem"])],
                    tanks: [
                        (name: "out", position: (-1, 0, 0), subtype: "OxygenTankSmall", ratio: 0.1),
                        (name: "in", position: (1, 0, 0), subtype: "OxygenTankSmall", ratio: 0.5),
                    ],
                )],
            )"#,
        )
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    #[test]
    fn builds_named_blocks() {
        let scene = build_scene_from_data(valve_scene(), GasSorterConfig::default()).unwrap();
        assert_eq!(scene.grid_names.len(), 1);
        assert_eq!(scene.block_names.len(), 3);
        assert_eq!(scene.tick, 0);
        assert_ratio_near(scene.tank_ratio("in").unwrap(), 0.5);

        let valve = scene.block_id("valve").unwrap();
        assert!(is_gas_control_enabled(&scene.world, valve));
        assert!(matches!(
            scene.tank_ratio("valve"),
            Err(SceneError::NotATank { .. })
        ));
        assert!(matches!(
            scene.block_id("nope"),
            Err(SceneError::NameNotFound { .. })
        ));
    }

    #[test]
    fn sorter_free_text_is_kept() {
        let data = parse(
            r#"(
                name: "text",
                grids: [(
                    name: "ship",
                    sorters: [
                        (name: "on", position: (0, 0, 0), facing: Up, custom_data: Some("note=keep\n")),
                        (name: "off", position: (5, 0, 0), facing: Up, gas_control: false, custom_data: Some("note=keep\n")),
                    ],
                )],
            )"#,
        );
        let scene = build_scene_from_data(data, GasSorterConfig::default()).unwrap();
        let on = scene.block_id("on").unwrap();
        let off = scene.block_id("off").unwrap();

        let text = scene.world.custom_data(on).unwrap();
        assert!(text.starts_with("note=keep\n"), "got: {text:?}");
        assert!(is_gas_control_enabled(&scene.world, on));
        assert_eq!(scene.world.custom_data(off).as_deref(), Some("note=keep\n"));
        assert!(!is_gas_control_enabled(&scene.world, off));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let data = parse(
            r#"(
                name: "dup",
                grids: [(
                    name: "ship",
                    tanks: [
                        (name: "t", position: (0, 0, 0), subtype: "OxygenTankSmall", ratio: 0.1),
                        (name: "t", position: (1, 0, 0), subtype: "OxygenTankSmall", ratio: 0.1),
                    ],
                )],
            )"#,
        );
        let err = build_scene_from_data(data, GasSorterConfig::default()).err().unwrap();
        assert!(matches!(err, SceneError::DuplicateName { ref name } if name == "t"));
    }

    #[test]
    fn unusable_tank_ratios_are_rejected() {
        for ratio in [f64::NAN, f64::INFINITY, 1e10, -0.5, 1.5] {
            let mut data = valve_scene();
            data.grids[0].tanks[1].ratio = ratio;
            let err = build_scene_from_data(data, GasSorterConfig::default()).err().unwrap();
            assert!(
                matches!(err, SceneError::InvalidRatio { ref name, .. } if name == "in"),
                "ratio {ratio}: got {err:?}"
            );
        }
    }

    #[test]
    fn boundary_tank_ratios_are_accepted() {
        let data = parse(
            r#"(
                name: "x",
                grids: [(
                    name: "g",
                    tanks: [
                        (name: "empty", position: (0, 0, 0), subtype: "OxygenTankSmall", ratio: 0.0),
                        (name: "full", position: (1, 0, 0), subtype: "OxygenTankSmall", ratio: 1.0),
                    ],
                )],
            )"#,
        );
        let scene = build_scene_from_data(data, GasSorterConfig::default()).unwrap();
        assert_eq!(scene.tank_ratio("empty").unwrap(), Fixed64::ZERO);
        assert_eq!(scene.tank_ratio("full").unwrap(), Fixed64::from_num(1));
    }

    #[test]
    fn overlapping_blocks_are_rejected() {
        let data = parse(
            r#"(
                name: "overlap",
                grids: [(
                    name: "ship",
                    tanks: [(name: "t", position: (0, 0, 0), subtype: "OxygenTankSmall", ratio: 0.1)],
                    blocks: [(name: "wall", position: (0, 0, 0), display_name: "Armor")],
                )],
            )"#,
        );
        let err = build_scene_from_data(data, GasSorterConfig::default()).err().unwrap();
        assert!(matches!(err, SceneError::World(_)), "got: {err:?}");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = GasSorterConfig::default();
        config.scan_interval = 0;
        let err = build_scene_from_data(valve_scene(), config).err().unwrap();
        assert!(matches!(err, SceneError::Config(_)), "got: {err:?}");
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    #[test]
    fn step_runs_scans_on_the_interval() {
        let mut scene = build_scene_from_data(valve_scene(), GasSorterConfig::default()).unwrap();
        for _ in 0..29 {
            assert!(scene.step().is_none());
        }
        let report = scene.step().unwrap();
        assert_eq!(report.tick, 30);
        assert_eq!(report.transfers, 1);
        assert_eq!(scene.last_report.as_ref(), Some(&report));
        assert_ratio_near(scene.tank_ratio("in").unwrap(), 0.4998);
        assert_ratio_near(scene.tank_ratio("out").unwrap(), 0.1002);
    }

    #[test]
    fn debug_scene_reports_on_debug_channel() {
        let mut data = valve_scene();
        data.debug = true;
        let mut scene = build_scene_from_data(data, GasSorterConfig::default()).unwrap();
        for _ in 0..300 {
            scene.step();
        }
        let lines: Vec<_> = scene.messages.on(Channel::Debug).collect();
        assert!(!lines.is_empty());
        assert!(lines.iter().any(|l| l.starts_with("[300] sorters=1")), "got: {lines:?}");
    }

    #[test]
    fn state_hash_is_deterministic() {
        let mut a = build_scene_from_data(valve_scene(), GasSorterConfig::default()).unwrap();
        let mut b = build_scene_from_data(valve_scene(), GasSorterConfig::default()).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        for _ in 0..90 {
            a.step();
            b.step();
        }
        assert_eq!(a.state_hash(), b.state_hash());
        a.step();
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
