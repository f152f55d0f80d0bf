//! Reporting boundary: rendering aggregated statistics and fanning them
//! out to an output writer and registered listeners.
//!
//! Rendering is pure string formatting with no shared mutable state, so the
//! reporting cycle never contends with the I/O threads feeding the
//! registry. A report renders each accumulator's record line followed by
//! its stack signature, one `at` line per frame:
//!
//! ```text
//! 2 read ops 4173 bytes in 17 ms, 1 write ops 128 bytes in 3 ms: [10.0.0.5]
//!     at myapp::client::fetch:42
//!     at myapp::main::run
//! ```

use std::io::Write;
use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{debug, warn};
use serde::Serialize;
use sockhound_common::Stack;

use crate::stats::{IoDetailAdder, IoSnapshot, IoStatsRegistry, StatisticAdder};

/// One aggregation bucket in a JSON report.
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    /// Rendered frames, innermost first.
    pub stack: Vec<String>,
    #[serde(flatten)]
    pub totals: IoSnapshot,
}

/// Renders registry snapshots and delivers them to the configured sinks.
///
/// Sinks are optional and independent: an output writer (typically a file
/// or stderr) receives the text report, and any number of channel listeners
/// receive the same text for in-process consumers. Listeners whose
/// receiving side has gone away are dropped on the next report.
#[derive(Default)]
pub struct Reporter {
    output: Option<Box<dyn Write + Send>>,
    listeners: Vec<Sender<String>>,
}

impl Reporter {
    /// A reporter with no sinks; useful when only [`Reporter::render`] or
    /// the JSON form is needed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send text reports to this writer.
    #[must_use]
    pub fn with_output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.output = Some(output);
        self
    }

    /// Also deliver each text report to this channel.
    pub fn add_listener(&mut self, listener: Sender<String>) {
        self.listeners.push(listener);
    }

    /// Render a set of (signature, accumulator) pairs as a text report.
    ///
    /// Entries are sorted by signature so successive reports over the same
    /// activity are comparable line-for-line.
    #[must_use]
    pub fn render(entries: &[(Stack, Arc<IoDetailAdder>)]) -> String {
        let mut sorted: Vec<&(Stack, Arc<IoDetailAdder>)> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::new();
        for (signature, adder) in sorted {
            out.push_str(&adder.to_line());
            out.push('\n');
            for frame in signature {
                out.push_str("    at ");
                out.push_str(&frame.to_string());
                out.push('\n');
            }
        }
        out
    }

    /// Snapshot the registry, render it, and deliver the text to every
    /// configured sink.
    ///
    /// # Errors
    ///
    /// Write or flush failure on the output writer. Listener delivery never
    /// fails the report; disconnected listeners are dropped.
    pub fn emit(&mut self, registry: &IoStatsRegistry) -> anyhow::Result<()> {
        let entries = registry.snapshot();
        let report = Self::render(&entries);
        debug!("emitting report: {} buckets, {} listeners", entries.len(), self.listeners.len());

        if let Some(output) = self.output.as_mut() {
            output.write_all(report.as_bytes())?;
            output.flush()?;
        }

        self.listeners.retain(|listener| {
            let delivered = listener.send(report.clone()).is_ok();
            if !delivered {
                warn!("dropping disconnected report listener");
            }
            delivered
        });

        Ok(())
    }

    /// Render the registry's current state as a JSON array of
    /// [`ReportEntry`] values, sorted by signature.
    ///
    /// # Errors
    ///
    /// Serialization failure from `serde_json`.
    pub fn to_json(registry: &IoStatsRegistry) -> anyhow::Result<String> {
        let mut entries = registry.snapshot();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let report: Vec<ReportEntry> = entries
            .iter()
            .map(|(signature, adder)| ReportEntry {
                stack: signature.iter().map(ToString::to_string).collect(),
                totals: adder.snapshot(),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("output", &self.output.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use sockhound_common::{IoDetail, StackFrame};

    fn populated_registry() -> IoStatsRegistry {
        let registry = IoStatsRegistry::new();
        let signature = vec![
            StackFrame::with_line("myapp::client", "fetch", 42),
            StackFrame::new("myapp::main", "run"),
        ];
        registry.record(signature, &IoDetail::read("10.0.0.5", 100, 5));
        registry
    }

    #[test]
    fn test_render_pairs_record_line_with_stack_frames() {
        let registry = populated_registry();
        let text = Reporter::render(&registry.snapshot());

        assert_eq!(
            text,
            "1 read ops 100 bytes in 5 ms, 0 write ops 0 bytes in 0 ms: [10.0.0.5]\n\
             \u{20}   at myapp::client::fetch:42\n\
             \u{20}   at myapp::main::run\n"
        );
    }

    #[test]
    fn test_render_sorts_buckets_by_signature() {
        let registry = IoStatsRegistry::new();
        registry.record(
            vec![StackFrame::new("zzz::late", "f")],
            &IoDetail::read("1.1.1.1", 1, 1),
        );
        registry.record(
            vec![StackFrame::new("aaa::early", "f")],
            &IoDetail::read("1.1.1.1", 1, 1),
        );

        let text = Reporter::render(&registry.snapshot());
        let aaa = text.find("aaa::early").unwrap();
        let zzz = text.find("zzz::late").unwrap();
        assert!(aaa < zzz);
    }

    #[test]
    fn test_emit_writes_to_output_and_listeners() {
        let registry = populated_registry();
        let (tx, rx) = unbounded();

        let mut reporter = Reporter::new().with_output(Box::new(Vec::new()));
        reporter.add_listener(tx);
        reporter.emit(&registry).unwrap();

        let delivered = rx.try_recv().unwrap();
        assert!(delivered.contains("1 read ops 100 bytes in 5 ms"));
        assert!(delivered.contains("at myapp::client::fetch:42"));
    }

    #[test]
    fn test_emit_drops_disconnected_listener() {
        let registry = populated_registry();
        let (tx, rx) = unbounded();
        drop(rx);

        let mut reporter = Reporter::new();
        reporter.add_listener(tx);
        reporter.emit(&registry).unwrap();
        reporter.emit(&registry).unwrap();
    }

    #[test]
    fn test_json_report_carries_stack_and_totals() {
        let registry = populated_registry();
        let json = Reporter::to_json(&registry).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let entry = &parsed.as_array().unwrap()[0];
        assert_eq!(entry["stack"][0], "myapp::client::fetch:42");
        assert_eq!(entry["read_bytes"], 100);
        assert_eq!(entry["addresses"][0], "10.0.0.5");
    }
}
