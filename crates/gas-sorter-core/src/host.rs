//! The seams between the core and the game that hosts it.
//!
//! [`World`] covers everything the scan reads or writes on the host side:
//! grid and sorter enumeration, block lookup by cell, tank fill ratios,
//! per-block free text and the multiplayer authority flag. [`Notifier`] is the
//! fire-and-forget chat channel used for replies and diagnostics.

use crate::block::{NeighborBlock, SorterBlock};
use crate::fixed::Fixed64;
use crate::grid::GridPosition;
use crate::id::{BlockId, GridId};

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

/// Errors reported by a host implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// A host subsystem is not initialized yet. Retried on the next tick.
    #[error("host subsystem unavailable: {0}")]
    Unavailable(&'static str),
    /// The block does not exist (removed, or on an unloaded grid).
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),
    /// The block exists but has no fill ratio.
    #[error("block is not a gas tank: {0}")]
    NotATank(BlockId),
    /// The host refused the operation.
    #[error("host rejected operation: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Host-side access to grids, blocks and block state.
///
/// Enumeration results are snapshots. Implementations are free to rebuild
/// them on every call.
pub trait World {
    /// All loaded grids.
    fn grids(&self) -> Result<Vec<GridId>, HostError>;

    /// Every conveyor sorter on `grid`.
    fn sorters(&self, grid: GridId) -> Result<Vec<SorterBlock>, HostError>;

    /// The block occupying `position` on `grid`, if any.
    fn block_at(&self, grid: GridId, position: GridPosition) -> Option<NeighborBlock>;

    /// Current fill ratio of a tank.
    fn fill_ratio(&self, tank: BlockId) -> Option<Fixed64>;

    /// Add `delta` (possibly negative) to a tank's fill ratio.
    fn change_fill_ratio(&mut self, tank: BlockId, delta: Fixed64) -> Result<(), HostError>;

    /// The block's free-text field. `None` when the block is unknown.
    fn custom_data(&self, block: BlockId) -> Option<String>;

    /// Replace the block's free-text field.
    fn set_custom_data(&mut self, block: BlockId, text: String) -> Result<(), HostError>;

    /// Whether this process owns the simulation and may change shared state.
    fn is_authoritative(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Message channel, rendered as a chat sender prefix by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// User-facing replies and error reports.
    Info,
    /// Debug traces, only produced while the debug switch is on.
    Debug,
}

impl Channel {
    pub fn prefix(self) -> &'static str {
        match self {
            Channel::Info => "GasSorter",
            Channel::Debug => "GasSorterDbg",
        }
    }
}

/// Fire-and-forget text output.
pub trait Notifier {
    fn notify(&mut self, channel: Channel, message: &str);
}

/// Discards everything. For dedicated servers without a chat surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _channel: Channel, _message: &str) {}
}
