//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and, via the `test-utils` feature, in the
//! integration tests of this and downstream crates.

use std::collections::{BTreeMap, BTreeSet};

use crate::block::{ItemFilter, NeighborBlock, SorterBlock, TankBlock};
use crate::custom_data::GAS_CONTROL_KEY;
use crate::fixed::{Fixed64, clamp_ratio, fixed64_to_f64};
use crate::grid::{Direction, GridPosition};
use crate::host::{Channel, HostError, Notifier, World};
use crate::id::{BlockId, GridId};

// ===========================================================================
// Fixed-point helpers
// ===========================================================================

pub fn ratio(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Assert a fill ratio is within 1e-6 of `expected`.
#[track_caller]
pub fn assert_ratio_near(actual: Fixed64, expected: f64) {
    let actual = fixed64_to_f64(actual);
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected ratio ~{expected}, got {actual}"
    );
}

// ===========================================================================
// Block constructors
// ===========================================================================

fn tank(subtype: &str, display_name: &str, fill: f64) -> TankBlock {
    TankBlock {
        id: BlockId(0),
        fill_ratio: ratio(fill),
        subtype: subtype.to_string(),
        display_name: display_name.to_string(),
    }
}

/// An oxygen tank template. The id is assigned when it is added to a world.
pub fn oxygen_tank(fill: f64) -> TankBlock {
    tank("OxygenTankSmall", "Oxygen Tank", fill)
}

/// A hydrogen tank template. The id is assigned when it is added to a world.
pub fn hydrogen_tank(fill: f64) -> TankBlock {
    tank("LargeHydrogenTank", "Hydrogen Tank", fill)
}

/// A modded tank whose names say nothing about the gas.
pub fn unknown_tank(fill: f64) -> TankBlock {
    tank("Tank_MK2", "Pressure Vessel", fill)
}

/// A powered, functional, switched-on sorter at the origin.
pub fn sorter_facing(id: BlockId, forward: Direction) -> SorterBlock {
    SorterBlock {
        id,
        position: GridPosition::new(0, 0, 0),
        forward,
        enabled: true,
        working: true,
        functional: true,
        filters: Vec::new(),
        custom_name: None,
        display_name: "Conveyor Sorter".to_string(),
    }
}

pub fn oxygen_filter() -> Vec<ItemFilter> {
    vec![ItemFilter::gas("OxygenGasItem")]
}

pub fn hydrogen_filter() -> Vec<ItemFilter> {
    vec![ItemFilter::gas("HydrogenGasItem")]
}

// ===========================================================================
// TestWorld
// ===========================================================================

#[derive(Debug, Clone)]
enum Kind {
    Sorter(SorterBlock),
    Tank(TankBlock),
    Other(String),
}

#[derive(Debug, Clone)]
struct Entry {
    grid: GridId,
    position: GridPosition,
    kind: Kind,
    custom_data: String,
}

/// A small in-memory [`World`] with fault injection.
#[derive(Debug, Clone)]
pub struct TestWorld {
    grids: Vec<GridId>,
    blocks: BTreeMap<BlockId, Entry>,
    cells: BTreeMap<(GridId, GridPosition), BlockId>,
    next_id: u64,
    authoritative: bool,
    grids_error: Option<HostError>,
    rejected_writes: BTreeSet<BlockId>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            grids: Vec::new(),
            blocks: BTreeMap::new(),
            cells: BTreeMap::new(),
            next_id: 1,
            authoritative: true,
            grids_error: None,
            rejected_writes: BTreeSet::new(),
        }
    }

    pub fn add_grid(&mut self) -> GridId {
        let id = GridId(self.grids.len() as u64 + 1);
        self.grids.push(id);
        id
    }

    fn insert(&mut self, grid: GridId, position: GridPosition, kind: Kind) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        let kind = match kind {
            Kind::Sorter(mut s) => {
                s.id = id;
                s.position = position;
                Kind::Sorter(s)
            }
            Kind::Tank(mut t) => {
                t.id = id;
                Kind::Tank(t)
            }
            other => other,
        };
        self.blocks.insert(
            id,
            Entry {
                grid,
                position,
                kind,
                custom_data: String::new(),
            },
        );
        self.cells.insert((grid, position), id);
        id
    }

    /// Add a sorter with Gas Control off (empty free text).
    pub fn add_sorter(&mut self, grid: GridId, position: GridPosition, forward: Direction) -> BlockId {
        self.insert(grid, position, Kind::Sorter(sorter_facing(BlockId(0), forward)))
    }

    pub fn add_tank(&mut self, grid: GridId, position: GridPosition, tank: TankBlock) -> BlockId {
        self.insert(grid, position, Kind::Tank(tank))
    }

    /// Add a block that is neither a sorter nor a tank.
    pub fn add_block(&mut self, grid: GridId, position: GridPosition, display_name: &str) -> BlockId {
        self.insert(grid, position, Kind::Other(display_name.to_string()))
    }

    pub fn remove_block(&mut self, id: BlockId) {
        if let Some(entry) = self.blocks.remove(&id) {
            self.cells.remove(&(entry.grid, entry.position));
        }
    }

    /// Write the Gas Control line directly into the block's free text.
    pub fn enable_gas_control(&mut self, id: BlockId) {
        let entry = self.blocks.get_mut(&id).expect("unknown block");
        entry.custom_data = format!("{GAS_CONTROL_KEY}1\n");
    }

    pub fn set_filters(&mut self, id: BlockId, filters: Vec<ItemFilter>) {
        self.sorter_mut(id).filters = filters;
    }

    pub fn sorter(&self, id: BlockId) -> &SorterBlock {
        match &self.blocks.get(&id).expect("unknown block").kind {
            Kind::Sorter(s) => s,
            _ => panic!("{id} is not a sorter"),
        }
    }

    pub fn sorter_mut(&mut self, id: BlockId) -> &mut SorterBlock {
        match &mut self.blocks.get_mut(&id).expect("unknown block").kind {
            Kind::Sorter(s) => s,
            _ => panic!("{id} is not a sorter"),
        }
    }

    /// Current fill ratio of a tank. Panics for non-tanks.
    pub fn ratio(&self, id: BlockId) -> Fixed64 {
        self.fill_ratio(id).expect("not a tank")
    }

    pub fn set_ratio(&mut self, id: BlockId, value: Fixed64) {
        match &mut self.blocks.get_mut(&id).expect("unknown block").kind {
            Kind::Tank(t) => t.fill_ratio = value,
            _ => panic!("{id} is not a tank"),
        }
    }

    /// What the scan would see in `position`.
    pub fn neighbor(&self, grid: GridId, position: GridPosition) -> Option<NeighborBlock> {
        self.block_at(grid, position)
    }

    pub fn set_authoritative(&mut self, authoritative: bool) {
        self.authoritative = authoritative;
    }

    /// Make every `grids()` call fail with `error`.
    pub fn fail_grids(&mut self, error: HostError) {
        self.grids_error = Some(error);
    }

    /// Make every fill-ratio change on `id` fail.
    pub fn reject_writes_to(&mut self, id: BlockId) {
        self.rejected_writes.insert(id);
    }
}

impl World for TestWorld {
    fn grids(&self) -> Result<Vec<GridId>, HostError> {
        match &self.grids_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.grids.clone()),
        }
    }

    fn sorters(&self, grid: GridId) -> Result<Vec<SorterBlock>, HostError> {
        Ok(self
            .blocks
            .values()
            .filter(|e| e.grid == grid)
            .filter_map(|e| match &e.kind {
                Kind::Sorter(s) => Some(s.clone()),
                _ => None,
            })
            .collect())
    }

    fn block_at(&self, grid: GridId, position: GridPosition) -> Option<NeighborBlock> {
        let id = *self.cells.get(&(grid, position))?;
        match &self.blocks.get(&id)?.kind {
            Kind::Tank(t) => Some(NeighborBlock::Tank(t.clone())),
            Kind::Sorter(s) => Some(NeighborBlock::Other {
                id,
                display_name: s.display_name.clone(),
            }),
            Kind::Other(name) => Some(NeighborBlock::Other {
                id,
                display_name: name.clone(),
            }),
        }
    }

    fn fill_ratio(&self, tank: BlockId) -> Option<Fixed64> {
        match &self.blocks.get(&tank)?.kind {
            Kind::Tank(t) => Some(t.fill_ratio),
            _ => None,
        }
    }

    fn change_fill_ratio(&mut self, tank: BlockId, delta: Fixed64) -> Result<(), HostError> {
        if self.rejected_writes.contains(&tank) {
            return Err(HostError::Rejected(format!("writes to {tank} are blocked")));
        }
        let entry = self
            .blocks
            .get_mut(&tank)
            .ok_or(HostError::BlockNotFound(tank))?;
        match &mut entry.kind {
            Kind::Tank(t) => {
                t.fill_ratio = clamp_ratio(t.fill_ratio + delta);
                Ok(())
            }
            _ => Err(HostError::NotATank(tank)),
        }
    }

    fn custom_data(&self, block: BlockId) -> Option<String> {
        self.blocks.get(&block).map(|e| e.custom_data.clone())
    }

    fn set_custom_data(&mut self, block: BlockId, text: String) -> Result<(), HostError> {
        let entry = self
            .blocks
            .get_mut(&block)
            .ok_or(HostError::BlockNotFound(block))?;
        entry.custom_data = text;
        Ok(())
    }

    fn is_authoritative(&self) -> bool {
        self.authoritative
    }
}

// ===========================================================================
// RecordingNotifier
// ===========================================================================

/// Collects every message it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Vec<(Channel, String)>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self, channel: Channel) -> Vec<String> {
        self.messages
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn info_lines(&self) -> Vec<String> {
        self.lines(Channel::Info)
    }

    pub fn debug_lines(&self) -> Vec<String> {
        self.lines(Channel::Debug)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, channel: Channel, message: &str) {
        self.messages.push((channel, message.to_string()));
    }
}
