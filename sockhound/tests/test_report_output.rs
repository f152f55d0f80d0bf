use std::fs::File;
use std::io::Read;

use sockhound::{IoDetail, IoStatsRegistry, Reporter, StackFrame};

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
fn test_report_written_to_file() {
    let registry = populated_registry();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("io-report.txt");
    let output = File::create(&path).expect("Failed to create report file");

    let mut reporter = Reporter::new().with_output(Box::new(output));
    reporter.emit(&registry).expect("Failed to emit report");

    let mut contents = String::new();
    File::open(&path)
        .expect("Failed to reopen report file")
        .read_to_string(&mut contents)
        .expect("Failed to read report file");

    assert!(contents
        .contains("1 read ops 100 bytes in 5 ms, 0 write ops 0 bytes in 0 ms: [10.0.0.5]"));
    assert!(contents.contains("    at myapp::client::fetch:42"));
    assert!(contents.contains("    at myapp::main::run"));
}

#[test]
fn test_json_export_is_valid_json() {
    let registry = populated_registry();

    let json = Reporter::to_json(&registry).expect("Failed to export JSON");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");

    let entries = parsed.as_array().expect("top level is an array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["stack"][0], "myapp::client::fetch:42");
    assert_eq!(entries[0]["read_count"], 1);
    assert_eq!(entries[0]["read_bytes"], 100);
    assert_eq!(entries[0]["write_count"], 0);
    assert_eq!(entries[0]["addresses"], serde_json::json!(["10.0.0.5"]));
}
