//! Snapshots of the host blocks the scan looks at.
//!
//! The host hands these out by value; they are not live views. A sorter's
//! snapshot is taken when its grid is enumerated and a neighbor's when the
//! sorter is resolved, right before dispatch.

use crate::filter::{GasType, classify_gas};
use crate::fixed::Fixed64;
use crate::grid::{Direction, GridPosition};
use crate::id::BlockId;
use serde::{Deserialize, Serialize};

/// One entry of a sorter's item filter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Item type, e.g. `"Ore"` or `"Component"`.
    pub type_name: String,
    /// Item subtype, e.g. `"Iron"` or `"OxygenGasItem"`.
    pub subtype: String,
}

impl ItemFilter {
    pub fn new(type_name: &str, subtype: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            subtype: subtype.to_string(),
        }
    }

    /// A placeholder gas item as shipped with the sorter's filter UI.
    pub fn gas(subtype: &str) -> Self {
        Self::new("GasItem", subtype)
    }
}

/// A conveyor sorter as seen by the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SorterBlock {
    pub id: BlockId,
    pub position: GridPosition,
    /// The way the sorter's arrow points. Gas flows backward -> forward.
    pub forward: Direction,
    /// The block's on/off switch.
    pub enabled: bool,
    /// Powered and functional.
    pub working: bool,
    /// Built past its functional threshold and not damaged below it.
    pub functional: bool,
    pub filters: Vec<ItemFilter>,
    pub custom_name: Option<String>,
    pub display_name: String,
}

impl SorterBlock {
    /// Cell immediately in front of the sorter.
    pub fn forward_position(&self) -> GridPosition {
        self.position.step(self.forward)
    }

    /// Cell immediately behind the sorter.
    pub fn backward_position(&self) -> GridPosition {
        self.position.step(self.forward.flipped())
    }

    /// Name to show in traces: custom name, then definition name, then "Sorter".
    pub fn label(&self) -> &str {
        match self.custom_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.display_name.trim().is_empty() => self.display_name.as_str(),
            _ => "Sorter",
        }
    }
}

/// A gas tank as seen by the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankBlock {
    pub id: BlockId,
    /// Fill ratio in `[0, 1]`.
    pub fill_ratio: Fixed64,
    pub subtype: String,
    pub display_name: String,
}

impl TankBlock {
    pub fn gas_type(&self) -> GasType {
        classify_gas(&self.subtype, &self.display_name)
    }
}

/// Whatever occupies a sorter's forward or backward cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NeighborBlock {
    Tank(TankBlock),
    Other { id: BlockId, display_name: String },
}

impl NeighborBlock {
    pub fn id(&self) -> BlockId {
        match self {
            NeighborBlock::Tank(tank) => tank.id,
            NeighborBlock::Other { id, .. } => *id,
        }
    }

    pub fn as_tank(&self) -> Option<&TankBlock> {
        match self {
            NeighborBlock::Tank(tank) => Some(tank),
            NeighborBlock::Other { .. } => None,
        }
    }

    /// Short description used by scan traces.
    pub fn describe(&self) -> &str {
        match self {
            NeighborBlock::Tank(_) => "GasTank",
            NeighborBlock::Other { display_name, .. } if !display_name.trim().is_empty() => {
                display_name.as_str()
            }
            NeighborBlock::Other { .. } => "other",
        }
    }
}

/// Describe an optional neighbor slot; empty cells read as `none`.
pub fn describe_slot(slot: Option<&NeighborBlock>) -> &str {
    slot.map_or("none", NeighborBlock::describe)
}
