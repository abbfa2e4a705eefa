//! In-memory host: grids, blocks and a chat log.

use std::collections::BTreeMap;

use slotmap::{SlotMap, new_key_type};

use gas_sorter_core::block::{NeighborBlock, SorterBlock, TankBlock};
use gas_sorter_core::fixed::{Fixed64, clamp_ratio};
use gas_sorter_core::grid::GridPosition;
use gas_sorter_core::host::{Channel, HostError, Notifier, World};
use gas_sorter_core::id::{BlockId, GridId};

new_key_type! {
    /// Slot of a grid inside a [`MemoryWorld`].
    pub struct GridKey;

    /// Slot of a block inside a [`MemoryWorld`].
    pub struct BlockKey;
}

// ===========================================================================
// Errors
// ===========================================================================

/// Errors from building or editing a [`MemoryWorld`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("unknown grid: {0}")]
    UnknownGrid(GridId),

    #[error("cell {position:?} on {grid} is already occupied")]
    Occupied { grid: GridId, position: GridPosition },
}

// ===========================================================================
// Storage
// ===========================================================================

#[derive(Debug, Clone)]
struct GridData {
    cells: BTreeMap<GridPosition, BlockKey>,
}

#[derive(Debug, Clone)]
enum BlockKind {
    Sorter(SorterBlock),
    Tank(TankBlock),
    Plain { display_name: String },
}

#[derive(Debug, Clone)]
struct BlockData {
    id: BlockId,
    grid: GridKey,
    position: GridPosition,
    kind: BlockKind,
    custom_data: String,
}

// ===========================================================================
// MemoryWorld
// ===========================================================================

/// A multi-grid world held entirely in memory.
///
/// Grids and blocks live in slot maps; each grid keeps a spatial index from
/// cell to block. Host ids are handed out sequentially starting at 1 and are
/// never reused.
#[derive(Debug, Clone)]
pub struct MemoryWorld {
    grids: SlotMap<GridKey, GridData>,
    blocks: SlotMap<BlockKey, BlockData>,
    grid_ids: BTreeMap<GridId, GridKey>,
    block_ids: BTreeMap<BlockId, BlockKey>,
    next_grid: u64,
    next_block: u64,
    authoritative: bool,
    available: bool,
    enumeration_fault: Option<String>,
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            grids: SlotMap::with_key(),
            blocks: SlotMap::with_key(),
            grid_ids: BTreeMap::new(),
            block_ids: BTreeMap::new(),
            next_grid: 1,
            next_block: 1,
            authoritative: true,
            available: true,
            enumeration_fault: None,
        }
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    pub fn add_grid(&mut self) -> GridId {
        let id = GridId(self.next_grid);
        self.next_grid += 1;
        let key = self.grids.insert(GridData {
            cells: BTreeMap::new(),
        });
        self.grid_ids.insert(id, key);
        id
    }

    /// Remove a grid and every block on it.
    pub fn remove_grid(&mut self, grid: GridId) -> bool {
        let Some(key) = self.grid_ids.remove(&grid) else {
            return false;
        };
        if let Some(data) = self.grids.remove(key) {
            for block_key in data.cells.into_values() {
                self.blocks.remove(block_key);
            }
        }
        let blocks = &self.blocks;
        self.block_ids.retain(|_, k| blocks.contains_key(*k));
        true
    }

    fn place(
        &mut self,
        grid: GridId,
        position: GridPosition,
        kind: BlockKind,
    ) -> Result<BlockId, WorldError> {
        let grid_key = *self
            .grid_ids
            .get(&grid)
            .ok_or(WorldError::UnknownGrid(grid))?;
        if self.grids[grid_key].cells.contains_key(&position) {
            return Err(WorldError::Occupied { grid, position });
        }

        let id = BlockId(self.next_block);
        self.next_block += 1;
        let kind = match kind {
            BlockKind::Sorter(mut sorter) => {
                sorter.id = id;
                sorter.position = position;
                BlockKind::Sorter(sorter)
            }
            BlockKind::Tank(mut tank) => {
                tank.id = id;
                tank.fill_ratio = clamp_ratio(tank.fill_ratio);
                BlockKind::Tank(tank)
            }
            plain => plain,
        };
        let key = self.blocks.insert(BlockData {
            id,
            grid: grid_key,
            position,
            kind,
            custom_data: String::new(),
        });
        self.grids[grid_key].cells.insert(position, key);
        self.block_ids.insert(id, key);
        Ok(id)
    }

    /// Place a sorter at `sorter.position`. Its id is assigned here.
    pub fn place_sorter(&mut self, grid: GridId, sorter: SorterBlock) -> Result<BlockId, WorldError> {
        let position = sorter.position;
        self.place(grid, position, BlockKind::Sorter(sorter))
    }

    /// Place a tank. Its id is assigned here and its ratio clamped to `[0, 1]`.
    pub fn place_tank(
        &mut self,
        grid: GridId,
        position: GridPosition,
        tank: TankBlock,
    ) -> Result<BlockId, WorldError> {
        self.place(grid, position, BlockKind::Tank(tank))
    }

    /// Place a block that is neither a sorter nor a tank.
    pub fn place_block(
        &mut self,
        grid: GridId,
        position: GridPosition,
        display_name: &str,
    ) -> Result<BlockId, WorldError> {
        self.place(
            grid,
            position,
            BlockKind::Plain {
                display_name: display_name.to_string(),
            },
        )
    }

    pub fn remove_block(&mut self, id: BlockId) -> bool {
        let Some(key) = self.block_ids.remove(&id) else {
            return false;
        };
        let Some(data) = self.blocks.remove(key) else {
            return false;
        };
        if let Some(grid) = self.grids.get_mut(data.grid) {
            grid.cells.remove(&data.position);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn block(&self, id: BlockId) -> Option<&BlockData> {
        self.blocks.get(*self.block_ids.get(&id)?)
    }

    fn block_mut(&mut self, id: BlockId) -> Option<&mut BlockData> {
        let key = *self.block_ids.get(&id)?;
        self.blocks.get_mut(key)
    }

    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn sorter(&self, id: BlockId) -> Option<&SorterBlock> {
        match &self.block(id)?.kind {
            BlockKind::Sorter(sorter) => Some(sorter),
            _ => None,
        }
    }

    /// Mutable access to a sorter's state flags and filters.
    pub fn sorter_mut(&mut self, id: BlockId) -> Option<&mut SorterBlock> {
        match &mut self.block_mut(id)?.kind {
            BlockKind::Sorter(sorter) => Some(sorter),
            _ => None,
        }
    }

    /// Overwrite a tank's fill ratio, clamped to `[0, 1]`.
    pub fn set_fill_ratio(&mut self, tank: BlockId, ratio: Fixed64) -> Result<(), HostError> {
        match &mut self
            .block_mut(tank)
            .ok_or(HostError::BlockNotFound(tank))?
            .kind
        {
            BlockKind::Tank(t) => {
                t.fill_ratio = clamp_ratio(ratio);
                Ok(())
            }
            _ => Err(HostError::NotATank(tank)),
        }
    }

    // -----------------------------------------------------------------------
    // Host state
    // -----------------------------------------------------------------------

    pub fn set_authoritative(&mut self, authoritative: bool) {
        self.authoritative = authoritative;
    }

    /// While unavailable, enumeration reports [`HostError::Unavailable`].
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Make grid enumeration fail with `reason`, or clear the fault with `None`.
    pub fn set_enumeration_fault(&mut self, reason: Option<String>) {
        self.enumeration_fault = reason;
    }
}

impl World for MemoryWorld {
    fn grids(&self) -> Result<Vec<GridId>, HostError> {
        if !self.available {
            return Err(HostError::Unavailable("grids"));
        }
        if let Some(reason) = &self.enumeration_fault {
            return Err(HostError::Rejected(reason.clone()));
        }
        Ok(self.grid_ids.keys().copied().collect())
    }

    fn sorters(&self, grid: GridId) -> Result<Vec<SorterBlock>, HostError> {
        if !self.available {
            return Err(HostError::Unavailable("blocks"));
        }
        // A grid removed since enumeration simply has no sorters left.
        let Some(data) = self.grid_ids.get(&grid).and_then(|k| self.grids.get(*k)) else {
            return Ok(Vec::new());
        };
        Ok(data
            .cells
            .values()
            .filter_map(|key| match &self.blocks.get(*key)?.kind {
                BlockKind::Sorter(sorter) => Some(sorter.clone()),
                _ => None,
            })
            .collect())
    }

    fn block_at(&self, grid: GridId, position: GridPosition) -> Option<NeighborBlock> {
        let grid_data = self.grids.get(*self.grid_ids.get(&grid)?)?;
        let key = *grid_data.cells.get(&position)?;
        let data = self.blocks.get(key)?;
        Some(match &data.kind {
            BlockKind::Tank(tank) => NeighborBlock::Tank(tank.clone()),
            BlockKind::Sorter(SorterBlock { display_name, .. })
            | BlockKind::Plain { display_name } => NeighborBlock::Other {
                id: data.id,
                display_name: display_name.clone(),
            },
        })
    }

    fn fill_ratio(&self, tank: BlockId) -> Option<Fixed64> {
        match &self.block(tank)?.kind {
            BlockKind::Tank(t) => Some(t.fill_ratio),
            _ => None,
        }
    }

    fn change_fill_ratio(&mut self, tank: BlockId, delta: Fixed64) -> Result<(), HostError> {
        let current = self.fill_ratio(tank).ok_or_else(|| match self.block(tank) {
            Some(_) => HostError::NotATank(tank),
            None => HostError::BlockNotFound(tank),
        })?;
        self.set_fill_ratio(tank, current + delta)
    }

    fn custom_data(&self, block: BlockId) -> Option<String> {
        self.block(block).map(|b| b.custom_data.clone())
    }

    fn set_custom_data(&mut self, block: BlockId, text: String) -> Result<(), HostError> {
        self.block_mut(block)
            .ok_or(HostError::BlockNotFound(block))?
            .custom_data = text;
        Ok(())
    }

    fn is_authoritative(&self) -> bool {
        self.authoritative
    }
}

// ===========================================================================
// MessageLog
// ===========================================================================

/// A [`Notifier`] that keeps every message, in order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<(Channel, String)>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[(Channel, String)] {
        &self.messages
    }

    /// Messages sent on `channel`.
    pub fn on(&self, channel: Channel) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(move |(c, _)| *c == channel)
            .map(|(_, text)| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Notifier for MessageLog {
    fn notify(&mut self, channel: Channel, message: &str) {
        tracing::trace!(channel = channel.prefix(), message, "chat");
        self.messages.push((channel, message.to_string()));
    }
}
