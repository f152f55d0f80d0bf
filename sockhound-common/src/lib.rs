//! # Shared Data Structures (capture shims ↔ probe core)
//!
//! Defines the value types exchanged between the instrumentation shims that
//! intercept socket/file I/O and the probe core that filters and aggregates
//! them. Everything here is a plain immutable value: capture sites build a
//! [`StackFrame`] sequence plus one [`IoDetail`] per observed operation and
//! hand both to the core, which never mutates them.
//!
//! ## Key Types
//!
//! - [`StackFrame`] - one entry of a captured call stack
//! - [`Stack`] - ordered frame sequence, innermost call site first
//! - [`IoDetail`] - one observed I/O event (address + read/write totals)

use std::fmt;

/// Maximum number of stack frames a capture shim should record per event.
///
/// Deeper stacks are truncated at capture time; the filter pipeline never
/// sees more than this many frames.
pub const MAX_STACK_DEPTH: usize = 127;

/// One entry in a captured call stack.
///
/// Identifies a module path and a member (function/method) within it, with
/// an optional source line. Frames are produced by the capture layer and are
/// never mutated afterwards - the filter pipeline only selects which frames
/// survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackFrame {
    /// Fully qualified module path (e.g. `myapp::client::http`).
    pub module: String,

    /// Member (function or method) name within the module.
    pub member: String,

    /// Source line, when the capture layer could resolve one.
    pub line: Option<u32>,
}

impl StackFrame {
    /// Create a frame without line information.
    #[must_use]
    pub fn new(module: impl Into<String>, member: impl Into<String>) -> Self {
        Self { module: module.into(), member: member.into(), line: None }
    }

    /// Create a frame with a resolved source line.
    #[must_use]
    pub fn with_line(module: impl Into<String>, member: impl Into<String>, line: u32) -> Self {
        Self { module: module.into(), member: member.into(), line: Some(line) }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.member)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}

/// Ordered sequence of captured frames, innermost call site first.
///
/// "Top" of the stack means the first elements of this vector; "bottom"
/// means the last. The convention is fixed - every consumer in the probe
/// core relies on it.
pub type Stack = Vec<StackFrame>;

/// One observed I/O event, split by read/write direction.
///
/// All counters are totals for this single event (an event usually carries
/// either the read or the write side, the other being zero). Validation is
/// the capture site's responsibility; the aggregator absorbs any `IoDetail`
/// unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IoDetail {
    /// String form of the remote endpoint (or file path for file I/O).
    pub address: String,

    /// Bytes read in this event.
    pub read_bytes: u64,

    /// Elapsed read time in milliseconds.
    pub read_time_ms: u64,

    /// Number of read operations (usually 0 or 1).
    pub read_count: u32,

    /// Bytes written in this event.
    pub write_bytes: u64,

    /// Elapsed write time in milliseconds.
    pub write_time_ms: u64,

    /// Number of write operations (usually 0 or 1).
    pub write_count: u32,
}

impl IoDetail {
    /// Event describing a single read operation.
    #[must_use]
    pub fn read(address: impl Into<String>, bytes: u64, elapsed_ms: u64) -> Self {
        Self {
            address: address.into(),
            read_bytes: bytes,
            read_time_ms: elapsed_ms,
            read_count: 1,
            write_bytes: 0,
            write_time_ms: 0,
            write_count: 0,
        }
    }

    /// Event describing a single write operation.
    #[must_use]
    pub fn write(address: impl Into<String>, bytes: u64, elapsed_ms: u64) -> Self {
        Self {
            address: address.into(),
            read_bytes: 0,
            read_time_ms: 0,
            read_count: 0,
            write_bytes: bytes,
            write_time_ms: elapsed_ms,
            write_count: 1,
        }
    }
}
