//! Gas Sorter Core -- directional gas valves built from conveyor sorters.
//!
//! A sorter with "Gas Control" switched on acts as a one-way valve between the
//! two blocks it touches: every scan it nudges a small amount of fill ratio
//! from the tank behind it into the tank in front of it, optionally limited to
//! oxygen or hydrogen tanks by the sorter's item filter list.
//!
//! The host game owns every block, grid and message channel. This crate only
//! talks to it through the [`host::World`] and [`host::Notifier`] traits, so
//! the same logic runs inside the game, in the headless runner and in tests.
//!
//! # Scan Pipeline
//!
//! Each call to [`session::GasSorterSession::on_tick`] that lands on the scan
//! cadence runs one scan:
//!
//! 1. **Enumerate** -- snapshot every grid and its sorters; keep those with
//!    Gas Control on that are functional.
//! 2. **Resolve** -- look up the blocks directly in front of and behind each
//!    sorter and infer the sorter's [`filter::FilterMode`].
//! 3. **Dispatch** -- hand a [`module::ScanContext`] to every module in the
//!    [`registry::ModuleRegistry`] whose enabled flag and interval allow it.
//!
//! # Key Types
//!
//! - [`session::GasSorterSession`] -- Owns configuration, modules and the
//!   debug switch for one game session.
//! - [`module::GasModule`] -- The closed set of pipeline modules.
//! - [`tank::TankTransferModule`] -- Tank-to-tank transfer with the
//!   anti-oscillation guard.
//! - [`diagnostics::DiagnosticsModule`] -- Buffered scan traces for the debug
//!   channel.
//! - [`custom_data`] -- Line-oriented key/value text stored on each block.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type used for fill ratios.

pub mod block;
pub mod command;
pub mod config;
pub mod custom_data;
pub mod diagnostics;
pub mod filter;
pub mod fixed;
pub mod gas_control;
pub mod grid;
pub mod host;
pub mod id;
pub mod info;
pub mod module;
pub mod registry;
pub mod session;
pub mod tank;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
