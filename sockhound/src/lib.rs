//! # Sockhound - In-Process Socket/File I/O Attribution Probe
//!
//! Sockhound attributes socket (and file) I/O activity to the call stacks
//! and remote addresses that caused it. Capture shims intercept I/O and
//! report one event per operation; this crate reduces the captured stack to
//! a policy-driven signature, aggregates events under that signature with
//! lock-free counters, and renders compact, mergeable statistics records
//! for periodic reporting.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              Instrumented Application Threads            │
//! │            (capture shims produce IoDetail +             │
//! │                  raw call stack per event)               │
//! └──────────────────────────┬───────────────────────────────┘
//!                            ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ StackFilter  │──▶│IoStatsRegistry│──▶│   Reporter   │
//! │  (signature) │   │ (lock-free   │   │ (text/JSON,  │
//! │              │   │  aggregation)│   │  listeners)  │
//! └──────────────┘   └──────────────┘   └──────────────┘
//!         │                  │
//!         │                  ▼
//!  ┌──────────────┐   ┌──────────────┐
//!  │ SubnetMatcher│   │ IoDetailAdder│
//!  │ (address     │   │ (atomics +   │
//!  │  predicates) │   │  address set)│
//!  └──────────────┘   └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`filter`]: the stack-filtering pipeline - a composable rule chain
//!   (platform exclusion, include/exclude patterns, ends-only trimming,
//!   blank-stack policy) turning a raw stack into an aggregation signature
//! - [`net`]: address predicates - exact host and CIDR subnet matching for
//!   deciding whether an observed remote endpoint is of interest
//! - [`stats`]: the concurrent statistics aggregator - mergeable
//!   accumulators with per-field atomic counters and a text round-trip,
//!   plus the signature→accumulator registry
//! - [`config`]: resolved filter-option values and filter construction
//! - [`report`]: the reporting boundary - snapshot rendering, output
//!   writer, listener fan-out, JSON export
//! - [`domain`]: error types
//!
//! ## Concurrency
//!
//! Nothing in the hot path blocks. Stack filtering is pure computation on
//! immutable configuration; every counter update is an independent relaxed
//! atomic add; the registry and address sets are sharded concurrent maps.
//! Readers may observe a torn cross-field view of a single event - the
//! statistics are periodic summaries, not a transactional ledger.

pub mod config;
pub mod domain;
pub mod filter;
pub mod net;
pub mod report;
pub mod stats;

pub use config::FilterOptions;
pub use filter::StackFilter;
pub use net::SubnetMatcher;
pub use report::Reporter;
pub use sockhound_common::{IoDetail, Stack, StackFrame};
pub use stats::{IoDetailAdder, IoStatsRegistry, StatisticAdder};
