//! Tunables for the scan, the tank transfer and the debug traces.
//!
//! Every field has a default, so partial config files only need to name what
//! they change. Ratios are plain `f64` here and converted to [`Fixed64`] once
//! when the modules are built.
//!
//! [`Fixed64`]: crate::fixed::Fixed64

use crate::fixed::Ticks;
use serde::{Deserialize, Serialize};

/// Top-level configuration for a [`GasSorterSession`](crate::session::GasSorterSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSorterConfig {
    /// Run a scan every this many ticks (30 = twice a second at 60 ticks/s).
    pub scan_interval: Ticks,
    pub transfer: TransferConfig,
    pub diagnostics: DiagnosticsConfig,
    pub chat: ChatConfig,
}

/// Tank transfer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Fill ratio moved per sorter per scan.
    pub amount: f64,
    /// A tank whose ratio moved more than this since the last scan is being
    /// driven by something else and is left alone.
    pub activity_threshold: f64,
    /// Sources at or below this ratio count as empty.
    pub empty_epsilon: f64,
    /// Destinations are never filled past this ratio.
    pub full_limit: f64,
    /// Module interval in ticks; 0 runs on every scan.
    pub interval: Ticks,
}

/// Debug trace tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Collect a trace batch on scans where `tick % interval == 0`.
    pub interval: Ticks,
    /// Records kept per batch before truncation.
    pub max_lines: usize,
    /// Records joined into one chat message.
    pub lines_per_message: usize,
    /// Records kept in the rolling log.
    pub rolling_max_lines: usize,
}

/// Chat command surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Command root, e.g. `/gassorter`.
    pub root: String,
}

impl Default for GasSorterConfig {
    fn default() -> Self {
        Self {
            scan_interval: 30,
            transfer: TransferConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            amount: 0.0002,
            activity_threshold: 0.0008,
            empty_epsilon: 0.000_000_1,
            full_limit: 0.999_999,
            interval: 0,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            interval: 300,
            max_lines: 200,
            lines_per_message: 10,
            rolling_max_lines: 5000,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            root: "/gassorter".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A configuration value outside its allowed range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("scan_interval must be at least 1 tick")]
    ZeroScanInterval,
    #[error("transfer.amount must be in (0, 1], got {0}")]
    AmountOutOfRange(f64),
    #[error("transfer.activity_threshold must be in [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("transfer.full_limit must be in (0, 1], got {0}")]
    FullLimitOutOfRange(f64),
    #[error("transfer.empty_epsilon must be in [0, full_limit), got {0}")]
    EmptyEpsilonOutOfRange(f64),
    #[error("diagnostics.{0} must be at least 1")]
    ZeroDiagnosticsSize(&'static str),
    #[error("chat.root must not be empty")]
    EmptyChatRoot,
}

impl GasSorterConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_interval == 0 {
            return Err(ConfigError::ZeroScanInterval);
        }

        let t = &self.transfer;
        // Ratios become Fixed64 when the modules are built; bounding them to
        // [0, 1] also rules out NaN, infinities and I32F32 overflow.
        if !(t.amount > 0.0 && t.amount <= 1.0) {
            return Err(ConfigError::AmountOutOfRange(t.amount));
        }
        if !(t.activity_threshold >= 0.0 && t.activity_threshold <= 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(t.activity_threshold));
        }
        if !(t.full_limit > 0.0 && t.full_limit <= 1.0) {
            return Err(ConfigError::FullLimitOutOfRange(t.full_limit));
        }
        if !(t.empty_epsilon >= 0.0 && t.empty_epsilon < t.full_limit) {
            return Err(ConfigError::EmptyEpsilonOutOfRange(t.empty_epsilon));
        }

        let d = &self.diagnostics;
        if d.interval == 0 {
            return Err(ConfigError::ZeroDiagnosticsSize("interval"));
        }
        if d.max_lines == 0 {
            return Err(ConfigError::ZeroDiagnosticsSize("max_lines"));
        }
        if d.lines_per_message == 0 {
            return Err(ConfigError::ZeroDiagnosticsSize("lines_per_message"));
        }
        if d.rolling_max_lines == 0 {
            return Err(ConfigError::ZeroDiagnosticsSize("rolling_max_lines"));
        }

        if self.chat.root.trim().is_empty() {
            return Err(ConfigError::EmptyChatRoot);
        }
        Ok(())
    }
}
