//! Scan traces for the debug channel.
//!
//! While the debug switch is on, every tenth scan (by default) opens a batch,
//! each dispatched sorter adds one CSV-style record to it, and the batch is
//! flushed to chat in chunks when the scan ends. Flushed records also go to a
//! bounded rolling log that can be written out as a CSV file.
//!
//! Nothing here touches the simulation.

use std::collections::VecDeque;
use std::io;

use crate::block::describe_slot;
use crate::config::DiagnosticsConfig;
use crate::fixed::Ticks;
use crate::host::{Channel, Notifier};
use crate::module::ScanContext;

/// First line of every batch and of the rolling log.
pub const TRACE_HEADER: &str = "tick,sorter,filter,fwd,back";

/// Render one trace record: `tick,'name',FilterMode,fwd,back`.
///
/// Single quotes in the sorter name are doubled.
pub fn trace_record(ctx: &ScanContext<'_>) -> String {
    let name = ctx.sorter.label().replace('\'', "''");
    format!(
        "{},'{}',{},{},{}",
        ctx.tick,
        name,
        ctx.filter_mode,
        describe_slot(ctx.forward),
        describe_slot(ctx.backward)
    )
}

// ---------------------------------------------------------------------------
// RollingLog
// ---------------------------------------------------------------------------

/// The most recent flushed records, oldest first.
#[derive(Debug, Clone)]
pub struct RollingLog {
    records: VecDeque<String>,
    max_records: usize,
}

impl RollingLog {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: VecDeque::new(),
            max_records,
        }
    }

    /// Append a record, dropping the oldest once over capacity.
    pub fn push(&mut self, record: String) {
        self.records.push_back(record);
        while self.records.len() > self.max_records {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(String::as_str)
    }

    /// Write the header and every record, one per line.
    pub fn write_csv<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{TRACE_HEADER}")?;
        for record in &self.records {
            writeln!(out, "{record}")?;
        }
        out.flush()
    }
}

// ---------------------------------------------------------------------------
// DiagnosticsModule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Batch {
    tick: Ticks,
    records: Vec<String>,
}

/// What a flush sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushSummary {
    pub tick: Ticks,
    /// Records captured during the scan.
    pub total: usize,
    /// Records actually sent, at most the configured cap.
    pub sent: usize,
    /// Chat messages emitted, summary line included.
    pub messages: usize,
}

impl FlushSummary {
    pub fn truncated(&self) -> bool {
        self.sent < self.total
    }
}

/// Buffers one trace record per dispatched sorter and flushes them in chunks.
#[derive(Debug, Clone)]
pub struct DiagnosticsModule {
    max_lines: usize,
    lines_per_message: usize,
    batch: Option<Batch>,
    rolling: RollingLog,
}

impl DiagnosticsModule {
    pub const NAME: &'static str = "Debug";

    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self {
            max_lines: config.max_lines.max(1),
            lines_per_message: config.lines_per_message.max(1),
            batch: None,
            rolling: RollingLog::new(config.rolling_max_lines),
        }
    }

    /// Open a batch for the scan on `tick`, discarding any unflushed one.
    pub fn begin_scan(&mut self, tick: Ticks) {
        self.batch = Some(Batch {
            tick,
            records: Vec::new(),
        });
    }

    pub fn is_collecting(&self) -> bool {
        self.batch.is_some()
    }

    /// Add a record for `ctx` if a batch is open. Returns whether one was added.
    pub fn record(&mut self, ctx: &ScanContext<'_>) -> bool {
        match self.batch.as_mut() {
            Some(batch) => {
                batch.records.push(trace_record(ctx));
                true
            }
            None => false,
        }
    }

    /// Close the open batch and send it to `notifier`.
    ///
    /// Only the authoritative participant sends; elsewhere the batch is
    /// dropped. Returns `None` when nothing was sent.
    pub fn end_scan(
        &mut self,
        notifier: &mut dyn Notifier,
        authoritative: bool,
    ) -> Option<FlushSummary> {
        let Batch { tick, mut records } = self.batch.take()?;
        if !authoritative {
            return None;
        }

        if records.is_empty() {
            notifier.notify(Channel::Debug, &format!("[{tick}] (no active gas sorters)"));
            return Some(FlushSummary {
                tick,
                total: 0,
                sent: 0,
                messages: 1,
            });
        }

        let total = records.len();
        let sent = total.min(self.max_lines);
        if total > sent {
            records.truncate(sent);
            records.push(format!(
                "[{tick}],(truncated),lines={total},cap={},,",
                self.max_lines
            ));
        }

        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(TRACE_HEADER);
        lines.extend(records.iter().map(String::as_str));

        let mut messages = 0;
        for chunk in lines.chunks(self.lines_per_message) {
            notifier.notify(Channel::Debug, &chunk.join(" | "));
            messages += 1;
        }

        let mut summary = format!("[{tick}] sorters={sent}");
        if total != sent {
            summary.push_str(&format!(" (truncated from {total})"));
        }
        notifier.notify(Channel::Debug, &summary);
        messages += 1;

        for record in records {
            self.rolling.push(record);
        }

        Some(FlushSummary {
            tick,
            total,
            sent,
            messages,
        })
    }

    pub fn rolling_log(&self) -> &RollingLog {
        &self.rolling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{NeighborBlock, TankBlock};
    use crate::filter::FilterMode;
    use crate::fixed::Fixed64;
    use crate::grid::Direction;
    use crate::id::{BlockId, GridId};
    use crate::test_utils::{RecordingNotifier, sorter_facing};

    fn module() -> DiagnosticsModule {
        DiagnosticsModule::from_config(&DiagnosticsConfig::default())
    }

    fn small_module(max_lines: usize, lines_per_message: usize) -> DiagnosticsModule {
        DiagnosticsModule::from_config(&DiagnosticsConfig {
            max_lines,
            lines_per_message,
            rolling_max_lines: 5,
            ..Default::default()
        })
    }

    fn tank() -> NeighborBlock {
        NeighborBlock::Tank(TankBlock {
            id: BlockId(2),
            fill_ratio: Fixed64::ZERO,
            subtype: "OxygenTankSmall".to_string(),
            display_name: "Oxygen Tank".to_string(),
        })
    }

    fn record_n(module: &mut DiagnosticsModule, n: usize, tick: Ticks) {
        let mut sorter = sorter_facing(BlockId(1), Direction::Forward);
        let fwd = tank();
        for i in 0..n {
            sorter.custom_name = Some(format!("S{i}"));
            let ctx = ScanContext {
                grid: GridId(1),
                sorter: &sorter,
                forward: Some(&fwd),
                backward: None,
                filter_mode: FilterMode::Both,
                tick,
            };
            module.record(&ctx);
        }
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    #[test]
    fn record_format_quotes_names() {
        let mut sorter = sorter_facing(BlockId(1), Direction::Forward);
        sorter.custom_name = Some("Bob's valve".to_string());
        let fwd = tank();
        let back = NeighborBlock::Other {
            id: BlockId(3),
            display_name: "Light Armor Block".to_string(),
        };
        let ctx = ScanContext {
            grid: GridId(1),
            sorter: &sorter,
            forward: Some(&fwd),
            backward: Some(&back),
            filter_mode: FilterMode::OxygenOnly,
            tick: 300,
        };
        assert_eq!(
            trace_record(&ctx),
            "300,'Bob''s valve',OxygenOnly,GasTank,Light Armor Block"
        );
    }

    #[test]
    fn nothing_recorded_without_open_batch() {
        let mut m = module();
        record_n(&mut m, 3, 300);
        assert!(!m.is_collecting());

        let mut chat = RecordingNotifier::new();
        assert_eq!(m.end_scan(&mut chat, true), None);
        assert!(chat.messages.is_empty());
    }

    // -----------------------------------------------------------------------
    // Flush
    // -----------------------------------------------------------------------

    #[test]
    fn empty_batch_reports_no_active_sorters() {
        let mut m = module();
        m.begin_scan(600);
        let mut chat = RecordingNotifier::new();
        let summary = m.end_scan(&mut chat, true).unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(chat.debug_lines(), vec!["[600] (no active gas sorters)"]);
        assert!(!m.is_collecting());
    }

    #[test]
    fn flush_chunks_header_and_records() {
        let mut m = small_module(200, 2);
        m.begin_scan(300);
        record_n(&mut m, 3, 300);
        let mut chat = RecordingNotifier::new();
        let summary = m.end_scan(&mut chat, true).unwrap();

        assert_eq!(
            chat.debug_lines(),
            vec![
                "tick,sorter,filter,fwd,back | 300,'S0',Both,GasTank,none",
                "300,'S1',Both,GasTank,none | 300,'S2',Both,GasTank,none",
                "[300] sorters=3",
            ]
        );
        assert_eq!(summary.messages, 3);
        assert!(!summary.truncated());
    }

    #[test]
    fn flush_truncates_over_cap() {
        let mut m = small_module(2, 10);
        m.begin_scan(900);
        record_n(&mut m, 5, 900);
        let mut chat = RecordingNotifier::new();
        let summary = m.end_scan(&mut chat, true).unwrap();

        let lines = chat.debug_lines();
        assert_eq!(lines.len(), 2);
        assert!(
            lines[0].ends_with("[900],(truncated),lines=5,cap=2,,"),
            "got: {}",
            lines[0]
        );
        assert_eq!(lines[1], "[900] sorters=2 (truncated from 5)");
        assert!(summary.truncated());
        assert_eq!(summary.sent, 2);
    }

    #[test]
    fn read_only_participant_drops_batch() {
        let mut m = module();
        m.begin_scan(300);
        record_n(&mut m, 2, 300);
        let mut chat = RecordingNotifier::new();

        assert_eq!(m.end_scan(&mut chat, false), None);
        assert!(chat.messages.is_empty());
        assert!(m.rolling_log().is_empty());
        assert!(!m.is_collecting());
    }

    // -----------------------------------------------------------------------
    // Rolling log
    // -----------------------------------------------------------------------

    #[test]
    fn rolling_log_keeps_newest_records() {
        let mut m = small_module(200, 10);
        let mut chat = RecordingNotifier::new();
        for tick in [300, 600, 900] {
            m.begin_scan(tick);
            record_n(&mut m, 2, tick);
            m.end_scan(&mut chat, true);
        }

        let log = m.rolling_log();
        assert_eq!(log.len(), 5);
        let first = log.records().next().unwrap();
        assert!(first.starts_with("300,'S1'"), "got: {first}");
    }

    #[test]
    fn rolling_log_writes_csv_with_header() {
        let mut log = RollingLog::new(10);
        log.push("1,'a',None,none,none".to_string());
        log.push("2,'b',None,none,none".to_string());
        let mut out = Vec::new();
        log.write_csv(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "tick,sorter,filter,fwd,back\n1,'a',None,none,none\n2,'b',None,none,none\n"
        );
    }
}
