//! One game session's worth of Gas Sorter state, and the scan that drives it.
//!
//! The host calls [`GasSorterSession::on_tick`] once per simulation tick. On
//! the scan cadence the session walks every grid, picks out the sorters with
//! Gas Control on, resolves the blocks in front of and behind each one and
//! hands the result to the module pipeline.
//!
//! A scan runs in two phases. Enumeration reads everything it needs from the
//! host first; only then are modules dispatched. A host failure during
//! enumeration therefore aborts the scan before anything was written.

use std::io;

use crate::block::SorterBlock;
use crate::command::{CommandOutcome, parse_command};
use crate::config::{ConfigError, GasSorterConfig};
use crate::diagnostics::{DiagnosticsModule, TRACE_HEADER};
use crate::filter::infer_filter_mode;
use crate::fixed::{Fixed64, Ticks};
use crate::gas_control::is_gas_control_enabled;
use crate::host::{Channel, HostError, Notifier, World};
use crate::id::GridId;
use crate::info::render_custom_info;
use crate::module::{ModuleEffect, ModuleError, ScanContext};
use crate::registry::ModuleRegistry;
use crate::tank::TransferOutcome;

// ---------------------------------------------------------------------------
// ScanReport
// ---------------------------------------------------------------------------

/// What one scan saw and did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub tick: Ticks,
    /// Grids enumerated.
    pub grids: usize,
    /// Sorters enumerated across all grids, Gas Control on or off.
    pub sorters: usize,
    /// Sorters handed to the module pipeline.
    pub dispatched: usize,
    /// Completed tank transfers.
    pub transfers: usize,
    /// Total fill ratio moved by those transfers.
    pub moved: Fixed64,
    /// Module calls that returned an error.
    pub module_faults: usize,
    /// The host was not ready; the scan was skipped quietly.
    pub host_unavailable: bool,
    /// Enumeration failed; nothing was dispatched.
    pub aborted: bool,
}

// ---------------------------------------------------------------------------
// GasSorterSession
// ---------------------------------------------------------------------------

/// Configuration, module pipeline and debug switch for one game session.
#[derive(Debug)]
pub struct GasSorterSession {
    config: GasSorterConfig,
    modules: ModuleRegistry,
    debug_enabled: bool,
}

impl Default for GasSorterSession {
    fn default() -> Self {
        let config = GasSorterConfig::default();
        Self {
            modules: ModuleRegistry::standard(&config),
            config,
            debug_enabled: false,
        }
    }
}

impl GasSorterSession {
    /// A session with the standard pipeline: tank transfer, then diagnostics.
    pub fn new(config: GasSorterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            modules: ModuleRegistry::standard(&config),
            config,
            debug_enabled: false,
        })
    }

    /// A session with a custom pipeline. Debug starts off, so any diagnostics
    /// slot is disabled.
    pub fn with_modules(
        config: GasSorterConfig,
        mut modules: ModuleRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if let Some(slot) = modules.get_mut(DiagnosticsModule::NAME) {
            slot.enabled = false;
        }
        Ok(Self {
            config,
            modules,
            debug_enabled: false,
        })
    }

    pub fn config(&self) -> &GasSorterConfig {
        &self.config
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.modules
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    /// Switch debug traces on or off. Also toggles the diagnostics module.
    pub fn set_debug_enabled(&mut self, enabled: bool) {
        if self.debug_enabled != enabled {
            tracing::info!(enabled, "gas sorter debug switched");
        }
        self.debug_enabled = enabled;
        if let Some(slot) = self.modules.get_mut(DiagnosticsModule::NAME) {
            slot.enabled = enabled;
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance to `tick`. Runs a scan when `tick` lands on the scan interval.
    pub fn on_tick(
        &mut self,
        tick: Ticks,
        world: &mut dyn World,
        notifier: &mut dyn Notifier,
    ) -> Option<ScanReport> {
        if tick % self.config.scan_interval != 0 {
            return None;
        }
        Some(self.run_scan(tick, world, notifier))
    }

    /// Run one scan unconditionally.
    pub fn run_scan(
        &mut self,
        tick: Ticks,
        world: &mut dyn World,
        notifier: &mut dyn Notifier,
    ) -> ScanReport {
        let mut report = ScanReport {
            tick,
            ..Default::default()
        };

        // The batch follows the registered slot's cadence, not the config.
        let collect = self.debug_enabled
            && self
                .modules
                .get(DiagnosticsModule::NAME)
                .is_some_and(|slot| slot.should_run(tick));
        if collect {
            if let Some(diag) = self.modules.diagnostics_mut() {
                diag.begin_scan(tick);
            }
        }

        match collect_eligible(&*world, &mut report) {
            Ok(eligible) => self.dispatch(tick, eligible, world, notifier, &mut report),
            Err(HostError::Unavailable(what)) => {
                tracing::trace!(tick, what, "host not ready, skipping gas scan");
                report.host_unavailable = true;
            }
            Err(e) => {
                tracing::warn!(tick, error = %e, "gas scan aborted");
                notifier.notify(Channel::Info, &format!("Gas scan error: {e}"));
                report.aborted = true;
            }
        }

        let authoritative = world.is_authoritative();
        if let Some(diag) = self.modules.diagnostics_mut() {
            diag.end_scan(notifier, authoritative);
        }

        tracing::debug!(
            tick,
            grids = report.grids,
            sorters = report.sorters,
            dispatched = report.dispatched,
            transfers = report.transfers,
            faults = report.module_faults,
            "gas scan finished"
        );
        report
    }

    fn dispatch(
        &mut self,
        tick: Ticks,
        eligible: Vec<(GridId, SorterBlock)>,
        world: &mut dyn World,
        notifier: &mut dyn Notifier,
        report: &mut ScanReport,
    ) {
        for (grid, sorter) in eligible {
            let forward = world.block_at(grid, sorter.forward_position());
            let backward = world.block_at(grid, sorter.backward_position());
            let ctx = ScanContext {
                grid,
                sorter: &sorter,
                forward: forward.as_ref(),
                backward: backward.as_ref(),
                filter_mode: infer_filter_mode(&sorter.filters),
                tick,
            };
            report.dispatched += 1;

            for slot in self.modules.slots_mut() {
                if !slot.should_run(tick) {
                    continue;
                }
                match slot.module.process(&ctx, world) {
                    Ok(ModuleEffect::Transfer(TransferOutcome::Transferred(amount))) => {
                        report.transfers += 1;
                        report.moved += amount;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let name = slot.module.name();
                        tracing::warn!(tick, module = name, sorter = %sorter.id, error = %e, "module failed");
                        notifier.notify(Channel::Info, &format!("Module '{name}' error: {e}"));
                        report.module_faults += 1;
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Player-facing surface
    // -----------------------------------------------------------------------

    /// Offer a chat message to the command handler.
    pub fn handle_chat_command(&mut self, message: &str) -> CommandOutcome {
        let root = self.config.chat.root.clone();
        let Some(command) = parse_command(&root, message) else {
            return CommandOutcome::NotHandled;
        };
        if let Some(enabled) = command.debug_switch() {
            self.set_debug_enabled(enabled);
        }
        CommandOutcome::Handled {
            reply: command.reply(&root, self.debug_enabled),
            suppress_broadcast: true,
        }
    }

    /// Info panel text for `sorter`.
    pub fn custom_info(&self, world: &dyn World, sorter: &SorterBlock) -> String {
        render_custom_info(
            is_gas_control_enabled(world, sorter.id),
            infer_filter_mode(&sorter.filters),
        )
    }

    /// Write the rolling debug log as CSV.
    pub fn write_debug_log<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        match self.modules.diagnostics() {
            Some(diag) => diag.rolling_log().write_csv(out),
            None => writeln!(out, "{TRACE_HEADER}"),
        }
    }

    // -----------------------------------------------------------------------
    // Save/load
    // -----------------------------------------------------------------------

    /// Serialized state of the module registered as `name`.
    pub fn module_state(&self, name: &str) -> Result<Vec<u8>, ModuleError> {
        self.modules
            .get(name)
            .map(|slot| slot.module.serialize_state())
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))
    }

    /// Restore the state of the module registered as `name`.
    pub fn load_module_state(&mut self, name: &str, data: &[u8]) -> Result<(), ModuleError> {
        self.modules
            .get_mut(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?
            .module
            .load_state(data)
    }
}

/// Enumeration phase: every sorter with Gas Control on that is functional.
fn collect_eligible(
    world: &dyn World,
    report: &mut ScanReport,
) -> Result<Vec<(GridId, SorterBlock)>, HostError> {
    let grids = world.grids()?;
    report.grids = grids.len();

    let mut eligible = Vec::new();
    for grid in grids {
        let sorters = world.sorters(grid)?;
        report.sorters += sorters.len();
        eligible.extend(
            sorters
                .into_iter()
                .filter(|s| s.functional && is_gas_control_enabled(world, s.id))
                .map(|s| (grid, s)),
        );
    }
    Ok(eligible)
}
