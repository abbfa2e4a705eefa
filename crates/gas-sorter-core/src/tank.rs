//! Tank-to-tank transfer through a sorter.
//!
//! Each scan moves a small slice of fill ratio from the tank behind a sorter
//! into the tank in front of it. Tanks that changed by more than the activity
//! threshold since the last scan are being driven by something else (the
//! vanilla conveyor network, a generator, a player) and are left alone for
//! that scan so the two sources don't fight.

use std::collections::BTreeMap;

use crate::config::TransferConfig;
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::host::{HostError, World};
use crate::id::BlockId;
use crate::module::{ModuleError, ScanContext};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Transfer tuning in fixed-point, converted once from [`TransferConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    pub amount: Fixed64,
    pub activity_threshold: Fixed64,
    pub empty_epsilon: Fixed64,
    pub full_limit: Fixed64,
}

impl From<&TransferConfig> for TransferSettings {
    fn from(config: &TransferConfig) -> Self {
        Self {
            amount: f64_to_fixed64(config.amount),
            activity_threshold: f64_to_fixed64(config.activity_threshold),
            empty_epsilon: f64_to_fixed64(config.empty_epsilon),
            full_limit: f64_to_fixed64(config.full_limit),
        }
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self::from(&TransferConfig::default())
    }
}

// ---------------------------------------------------------------------------
// ActivityHistory
// ---------------------------------------------------------------------------

/// Last fill ratio seen per tank. Entries are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityHistory {
    last: BTreeMap<BlockId, Fixed64>,
}

impl ActivityHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `ratio` for `tank` and report whether it moved by more than
    /// `threshold` since the previous observation. A first sighting is never
    /// active.
    pub fn observe(&mut self, tank: BlockId, ratio: Fixed64, threshold: Fixed64) -> bool {
        match self.last.insert(tank, ratio) {
            Some(previous) => (ratio - previous).abs() > threshold,
            None => false,
        }
    }

    /// Overwrite the remembered ratio without an activity check.
    pub fn record(&mut self, tank: BlockId, ratio: Fixed64) {
        self.last.insert(tank, ratio);
    }

    pub fn last(&self, tank: BlockId) -> Option<Fixed64> {
        self.last.get(&tank).copied()
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a transfer did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// This process may not change shared state.
    NotAuthoritative,
    /// The sorter's on/off switch is off.
    SorterOff,
    /// The sorter is unpowered or damaged.
    NotWorking,
    /// One of the neighbor cells is not a tank.
    NotTankToTank,
    /// The filter mode rules out one of the tanks.
    FilterMismatch,
    /// A tank changed externally since the last scan.
    ExternalActivity,
    SourceEmpty,
    DestinationFull,
    /// Clamping left nothing to move.
    NothingToMove,
}

/// Result of one [`TankTransferModule::apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferOutcome {
    /// This much fill ratio moved backward -> forward.
    Transferred(Fixed64),
    Skipped(SkipReason),
}

impl TransferOutcome {
    pub fn moved(&self) -> Fixed64 {
        match self {
            TransferOutcome::Transferred(amount) => *amount,
            TransferOutcome::Skipped(_) => Fixed64::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// TankTransferModule
// ---------------------------------------------------------------------------

/// Moves fill ratio between the two tanks around a sorter.
#[derive(Debug, Clone, Default)]
pub struct TankTransferModule {
    settings: TransferSettings,
    history: ActivityHistory,
}

impl TankTransferModule {
    pub const NAME: &'static str = "Tanks";

    pub fn new(settings: TransferSettings) -> Self {
        Self {
            settings,
            history: ActivityHistory::new(),
        }
    }

    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(TransferSettings::from(config))
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    pub fn history(&self) -> &ActivityHistory {
        &self.history
    }

    /// Run the transfer rule for one sorter.
    pub fn apply(
        &mut self,
        ctx: &ScanContext<'_>,
        world: &mut dyn World,
    ) -> Result<TransferOutcome, ModuleError> {
        use SkipReason::*;

        if !world.is_authoritative() {
            return Ok(TransferOutcome::Skipped(NotAuthoritative));
        }
        let sorter = ctx.sorter;
        if !sorter.enabled {
            return Ok(TransferOutcome::Skipped(SorterOff));
        }
        if !sorter.working || !sorter.functional {
            return Ok(TransferOutcome::Skipped(NotWorking));
        }

        let (Some(fwd), Some(back)) = (
            ctx.forward.and_then(|n| n.as_tank()),
            ctx.backward.and_then(|n| n.as_tank()),
        ) else {
            return Ok(TransferOutcome::Skipped(NotTankToTank));
        };

        if !ctx.filter_mode.admits(fwd.gas_type(), back.gas_type()) {
            return Ok(TransferOutcome::Skipped(FilterMismatch));
        }

        let fwd_ratio = world
            .fill_ratio(fwd.id)
            .ok_or(HostError::NotATank(fwd.id))?;
        let back_ratio = world
            .fill_ratio(back.id)
            .ok_or(HostError::NotATank(back.id))?;

        // Both tanks are observed every time so neither history entry goes stale.
        let threshold = self.settings.activity_threshold;
        let fwd_active = self.history.observe(fwd.id, fwd_ratio, threshold);
        let back_active = self.history.observe(back.id, back_ratio, threshold);
        if fwd_active || back_active {
            return Ok(TransferOutcome::Skipped(ExternalActivity));
        }

        let s = &self.settings;
        if back_ratio <= s.empty_epsilon {
            return Ok(TransferOutcome::Skipped(SourceEmpty));
        }
        if fwd_ratio >= s.full_limit {
            return Ok(TransferOutcome::Skipped(DestinationFull));
        }

        let amount = s.amount.min(back_ratio).min(s.full_limit - fwd_ratio);
        if amount <= Fixed64::ZERO {
            return Ok(TransferOutcome::Skipped(NothingToMove));
        }

        world.change_fill_ratio(back.id, -amount)?;
        if let Err(e) = world.change_fill_ratio(fwd.id, amount) {
            // Put the source back so nothing is lost.
            world.change_fill_ratio(back.id, amount)?;
            return Err(e.into());
        }

        let fwd_after = world.fill_ratio(fwd.id).unwrap_or(fwd_ratio + amount);
        let back_after = world.fill_ratio(back.id).unwrap_or(back_ratio - amount);
        self.history.record(fwd.id, fwd_after);
        self.history.record(back.id, back_after);

        tracing::debug!(
            sorter = %sorter.id,
            from = %back.id,
            to = %fwd.id,
            amount = %amount,
            "moved gas between tanks"
        );
        Ok(TransferOutcome::Transferred(amount))
    }

    /// Encode the activity history for save games.
    pub fn serialize_state(&self) -> Vec<u8> {
        match bitcode::serialize(&self.history) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode tank activity history");
                Vec::new()
            }
        }
    }

    /// Restore the activity history. Empty input clears it.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), ModuleError> {
        if data.is_empty() {
            self.history = ActivityHistory::new();
            return Ok(());
        }
        self.history =
            bitcode::deserialize(data).map_err(|e| ModuleError::DeserializeFailed(e.to_string()))?;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
