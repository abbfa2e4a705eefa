use serde::{Deserialize, Serialize};

use gas_sorter_core::block::ItemFilter;
use gas_sorter_core::grid::{Direction, GridPosition};

/// Top-level scene definition, deserialized from `scene.ron`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Start with the debug switch on.
    #[serde(default)]
    pub debug: bool,
    /// Whether this process owns the simulation.
    #[serde(default = "default_true")]
    pub authoritative: bool,
    pub grids: Vec<SceneGrid>,
}

/// One grid (ship or station) and everything built on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneGrid {
    pub name: String,
    #[serde(default)]
    pub sorters: Vec<SceneSorter>,
    #[serde(default)]
    pub tanks: Vec<SceneTank>,
    #[serde(default)]
    pub blocks: Vec<SceneBlock>,
}

/// A conveyor sorter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSorter {
    pub name: String,
    pub position: (i32, i32, i32),
    pub facing: Direction,
    /// Filter entries: `"Type/Subtype"`, or a bare subtype for a gas item.
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default = "default_true")]
    pub gas_control: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub working: bool,
    #[serde(default = "default_true")]
    pub functional: bool,
    #[serde(default)]
    pub custom_name: Option<String>,
    /// Extra free text written to the block before the Gas Control line.
    #[serde(default)]
    pub custom_data: Option<String>,
}

/// A gas tank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneTank {
    pub name: String,
    pub position: (i32, i32, i32),
    pub subtype: String,
    #[serde(default)]
    pub display_name: String,
    pub ratio: f64,
}

/// Any other block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneBlock {
    pub name: String,
    pub position: (i32, i32, i32),
    pub display_name: String,
}

fn default_true() -> bool {
    true
}

/// Convert a scene position tuple into a grid cell.
pub fn cell((x, y, z): (i32, i32, i32)) -> GridPosition {
    GridPosition::new(x, y, z)
}

/// Parse a filter entry. `"Ore/Iron"` is an item, `"OxygenGasItem"` a gas.
pub fn parse_filter(entry: &str) -> ItemFilter {
    match entry.split_once('/') {
        Some((type_name, subtype)) => ItemFilter::new(type_name.trim(), subtype.trim()),
        None => ItemFilter::gas(entry.trim()),
    }
}
