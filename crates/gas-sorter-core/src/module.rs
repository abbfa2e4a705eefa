//! The scan's module pipeline.
//!
//! Every eligible sorter is handed to each registered module as a
//! [`ScanContext`]. The set of modules is closed: [`GasModule`] is an enum and
//! dispatch is an exhaustive match, so adding a module means adding a variant.
//! Each module sits in a [`ModuleSlot`] that carries its enabled flag and tick
//! interval.

use crate::block::{NeighborBlock, SorterBlock};
use crate::diagnostics::DiagnosticsModule;
use crate::filter::FilterMode;
use crate::fixed::Ticks;
use crate::host::{HostError, World};
use crate::id::GridId;
use crate::tank::{TankTransferModule, TransferOutcome};

// ---------------------------------------------------------------------------
// ScanContext
// ---------------------------------------------------------------------------

/// Everything a module sees about one sorter during one scan.
///
/// Borrowed for the duration of a single dispatch.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub grid: GridId,
    pub sorter: &'a SorterBlock,
    /// Block in the cell the sorter points at, if any.
    pub forward: Option<&'a NeighborBlock>,
    /// Block in the cell behind the sorter, if any.
    pub backward: Option<&'a NeighborBlock>,
    pub filter_mode: FilterMode,
    /// The logic tick this scan runs on.
    pub tick: Ticks,
}

// ---------------------------------------------------------------------------
// GasModule
// ---------------------------------------------------------------------------

/// The closed set of pipeline modules, in no particular order.
/// Dispatch order is the order of the [`ModuleRegistry`](crate::registry::ModuleRegistry).
#[derive(Debug)]
pub enum GasModule {
    TankTransfer(TankTransferModule),
    Diagnostics(DiagnosticsModule),
}

/// What a module did with one context.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleEffect {
    Transfer(TransferOutcome),
    /// A trace record was captured.
    Traced,
    /// The module looked at the context and had nothing to do.
    Idle,
}

impl GasModule {
    /// Registration name. Unique within a registry.
    pub fn name(&self) -> &str {
        match self {
            GasModule::TankTransfer(_) => TankTransferModule::NAME,
            GasModule::Diagnostics(_) => DiagnosticsModule::NAME,
        }
    }

    /// Run this module against one sorter.
    pub fn process(
        &mut self,
        ctx: &ScanContext<'_>,
        world: &mut dyn World,
    ) -> Result<ModuleEffect, ModuleError> {
        match self {
            GasModule::TankTransfer(tanks) => tanks.apply(ctx, world).map(ModuleEffect::Transfer),
            GasModule::Diagnostics(diag) => Ok(if diag.record(ctx) {
                ModuleEffect::Traced
            } else {
                ModuleEffect::Idle
            }),
        }
    }

    /// Serialize internal state for save games. Stateless modules return an
    /// empty vec.
    pub fn serialize_state(&self) -> Vec<u8> {
        match self {
            GasModule::TankTransfer(tanks) => tanks.serialize_state(),
            GasModule::Diagnostics(_) => Vec::new(),
        }
    }

    /// Restore state produced by [`serialize_state`](Self::serialize_state).
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), ModuleError> {
        match self {
            GasModule::TankTransfer(tanks) => tanks.load_state(data),
            GasModule::Diagnostics(_) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// ModuleSlot
// ---------------------------------------------------------------------------

/// A registered module with its dispatch gate.
#[derive(Debug)]
pub struct ModuleSlot {
    pub module: GasModule,
    pub enabled: bool,
    /// 0 runs on every scan; otherwise only when `tick % interval == 0`.
    pub interval: Ticks,
}

impl ModuleSlot {
    pub fn new(module: GasModule, enabled: bool, interval: Ticks) -> Self {
        Self {
            module,
            enabled,
            interval,
        }
    }

    /// Whether this module runs for a scan on `tick`.
    pub fn should_run(&self, tick: Ticks) -> bool {
        self.enabled && (self.interval == 0 || tick % self.interval == 0)
    }
}

// ---------------------------------------------------------------------------
// ModuleError
// ---------------------------------------------------------------------------

/// Errors that can occur during module operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModuleError {
    /// The host refused or failed a read or write.
    #[error(transparent)]
    Host(#[from] HostError),
    /// Failed to deserialize module state from saved data.
    #[error("deserialize failed: {0}")]
    DeserializeFailed(String),
    /// A module with the given name was not found.
    #[error("module not found: {0}")]
    NotFound(String),
}

// ===========================================================================
// Tests
// ===========================================================================
