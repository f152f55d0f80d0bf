//! Feed a few synthetic captures through the full pipeline and print the
//! resulting report to stdout.
//!
//! Run with `RUST_LOG=debug` to see the filter and reporter logging.

use std::io::stdout;

use sockhound::{FilterOptions, IoDetail, IoStatsRegistry, Reporter, StackFrame};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let filter = FilterOptions::default().build()?;
    let registry = IoStatsRegistry::new();

    let fetch = vec![
        StackFrame::new("std::io", "read"),
        StackFrame::new("tokio::net::tcp", "poll_read"),
        StackFrame::with_line("demo::client", "fetch", 42),
        StackFrame::new("demo::main", "run"),
    ];
    let upload = vec![
        StackFrame::new("std::io", "write"),
        StackFrame::with_line("demo::uploader", "push", 17),
        StackFrame::new("demo::main", "run"),
    ];

    registry.record(filter.apply(&fetch), &IoDetail::read("10.0.0.5", 4096, 12));
    registry.record(filter.apply(&fetch), &IoDetail::read("10.0.0.6", 2048, 7));
    registry.record(filter.apply(&upload), &IoDetail::write("192.168.1.9", 512, 3));

    let mut reporter = Reporter::new().with_output(Box::new(stdout()));
    reporter.emit(&registry)?;

    println!("--- json ---");
    println!("{}", Reporter::to_json(&registry)?);
    Ok(())
}
