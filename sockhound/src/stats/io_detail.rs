//! Lock-free accumulator for socket/file I/O events.
//!
//! An [`IoDetailAdder`] is shared by every thread reporting under the same
//! aggregation key. Six independent atomic counters plus a concurrent
//! deduplicating address set let every `add`/`merge` proceed without one
//! thread blocking on another. The trade-off is that there is no atomic
//! multi-field snapshot: a reader racing an `add` may observe some of the
//! event's counters applied and others not. Aggregated statistics are
//! periodic summaries, so a torn single event is acceptable.
//!
//! The serialized form is a fixed single-line record:
//!
//! ```text
//! 1 read ops 100 bytes in 5 ms, 1 write ops 50 bytes in 2 ms: [1.2.3.4]
//! ```
//!
//! with the address list sorted and deduplicated for determinism.
//! [`IoDetailAdder::set_from_line`] is the exact inverse.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use dashmap::DashSet;
use serde::Serialize;
use sockhound_common::IoDetail;

use crate::domain::errors::StatsParseError;
use crate::stats::StatisticAdder;

/// Concurrently updated accumulator over [`IoDetail`] events.
#[derive(Debug, Default)]
pub struct IoDetailAdder {
    addresses: DashSet<String>,
    read_bytes: AtomicU64,
    read_time_ms: AtomicU64,
    read_count: AtomicU32,
    write_bytes: AtomicU64,
    write_time_ms: AtomicU64,
    write_count: AtomicU32,
}

/// Per-field point-in-time view of an accumulator.
///
/// Each field is a consistent snapshot of its own counter at the instant it
/// was read; the fields together are not a frozen cross-field snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IoSnapshot {
    pub read_count: u32,
    pub read_bytes: u64,
    pub read_time_ms: u64,
    pub write_count: u32,
    pub write_bytes: u64,
    pub write_time_ms: u64,
    /// Sorted, deduplicated addresses seen under this key.
    pub addresses: Vec<String>,
}

impl IoDetailAdder {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct an accumulator from a record line produced by
    /// [`StatisticAdder::to_line`].
    ///
    /// # Errors
    ///
    /// [`StatsParseError`] when the line does not match the record grammar.
    pub fn from_line(line: &str) -> Result<Self, StatsParseError> {
        let adder = Self::new();
        adder.set_from_line(line)?;
        Ok(adder)
    }

    /// Read every counter and the address set.
    #[must_use]
    pub fn snapshot(&self) -> IoSnapshot {
        let mut addresses: Vec<String> =
            self.addresses.iter().map(|addr| addr.key().clone()).collect();
        addresses.sort();

        IoSnapshot {
            read_count: self.read_count.load(Ordering::Relaxed),
            read_bytes: self.read_bytes.load(Ordering::Relaxed),
            read_time_ms: self.read_time_ms.load(Ordering::Relaxed),
            write_count: self.write_count.load(Ordering::Relaxed),
            write_bytes: self.write_bytes.load(Ordering::Relaxed),
            write_time_ms: self.write_time_ms.load(Ordering::Relaxed),
            addresses,
        }
    }
}

impl StatisticAdder for IoDetailAdder {
    type Event = IoDetail;

    fn add(&self, event: &IoDetail) {
        self.addresses.insert(event.address.clone());
        self.read_bytes.fetch_add(event.read_bytes, Ordering::Relaxed);
        self.read_time_ms.fetch_add(event.read_time_ms, Ordering::Relaxed);
        self.read_count.fetch_add(event.read_count, Ordering::Relaxed);
        self.write_bytes.fetch_add(event.write_bytes, Ordering::Relaxed);
        self.write_time_ms.fetch_add(event.write_time_ms, Ordering::Relaxed);
        self.write_count.fetch_add(event.write_count, Ordering::Relaxed);
    }

    fn merge(&self, other: &Self) {
        for addr in other.addresses.iter() {
            self.addresses.insert(addr.key().clone());
        }
        self.read_bytes.fetch_add(other.read_bytes.load(Ordering::Relaxed), Ordering::Relaxed);
        self.read_time_ms
            .fetch_add(other.read_time_ms.load(Ordering::Relaxed), Ordering::Relaxed);
        self.read_count.fetch_add(other.read_count.load(Ordering::Relaxed), Ordering::Relaxed);
        self.write_bytes.fetch_add(other.write_bytes.load(Ordering::Relaxed), Ordering::Relaxed);
        self.write_time_ms
            .fetch_add(other.write_time_ms.load(Ordering::Relaxed), Ordering::Relaxed);
        self.write_count.fetch_add(other.write_count.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    fn to_line(&self) -> String {
        let snap = self.snapshot();
        format!(
            "{} read ops {} bytes in {} ms, {} write ops {} bytes in {} ms: [{}]",
            snap.read_count,
            snap.read_bytes,
            snap.read_time_ms,
            snap.write_count,
            snap.write_bytes,
            snap.write_time_ms,
            snap.addresses.join(", ")
        )
    }

    fn set_from_line(&self, line: &str) -> Result<(), StatsParseError> {
        let parsed = parse_line(line)?;

        self.read_count.store(parsed.read_count, Ordering::Relaxed);
        self.read_bytes.store(parsed.read_bytes, Ordering::Relaxed);
        self.read_time_ms.store(parsed.read_time_ms, Ordering::Relaxed);
        self.write_count.store(parsed.write_count, Ordering::Relaxed);
        self.write_bytes.store(parsed.write_bytes, Ordering::Relaxed);
        self.write_time_ms.store(parsed.write_time_ms, Ordering::Relaxed);

        self.addresses.clear();
        for address in parsed.addresses {
            self.addresses.insert(address);
        }
        Ok(())
    }
}

struct ParsedRecord {
    read_count: u32,
    read_bytes: u64,
    read_time_ms: u64,
    write_count: u32,
    write_bytes: u64,
    write_time_ms: u64,
    addresses: Vec<String>,
}

fn parse_line(line: &str) -> Result<ParsedRecord, StatsParseError> {
    let malformed = || StatsParseError::Malformed(line.to_string());

    let (counters, bracketed) = line.trim().split_once(": [").ok_or_else(malformed)?;
    let address_csv = bracketed.strip_suffix(']').ok_or_else(malformed)?;
    let (read_part, write_part) = counters.split_once(',').ok_or_else(malformed)?;

    let (read_count, read_bytes, read_time_ms) = parse_side(read_part, "read", line)?;
    let (write_count, write_bytes, write_time_ms) = parse_side(write_part, "write", line)?;

    let addresses = address_csv
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ParsedRecord {
        read_count,
        read_bytes,
        read_time_ms,
        write_count,
        write_bytes,
        write_time_ms,
        addresses,
    })
}

/// Parse one direction's `<count> <op> ops <bytes> bytes in <time> ms`.
fn parse_side(
    part: &str,
    op: &'static str,
    line: &str,
) -> Result<(u32, u64, u64), StatsParseError> {
    let tokens: Vec<&str> = part.split_whitespace().collect();
    let [count, op_word, ops_word, bytes, bytes_word, in_word, time, ms_word] = tokens[..] else {
        return Err(StatsParseError::Malformed(line.to_string()));
    };
    if op_word != op
        || ops_word != "ops"
        || bytes_word != "bytes"
        || in_word != "in"
        || ms_word != "ms"
    {
        return Err(StatsParseError::Malformed(line.to_string()));
    }

    let (count_field, bytes_field, time_field) = if op == "read" {
        ("read ops", "read bytes", "read time")
    } else {
        ("write ops", "write bytes", "write time")
    };

    Ok((
        parse_number(count, count_field)?,
        parse_number(bytes, bytes_field)?,
        parse_number(time, time_field)?,
    ))
}

fn parse_number<T: FromStr>(value: &str, field: &'static str) -> Result<T, StatsParseError> {
    value
        .parse()
        .map_err(|_| StatsParseError::NonNumeric { field, value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_accumulates_each_direction() {
        let adder = IoDetailAdder::new();
        adder.add(&IoDetail::read("1.2.3.4", 100, 5));
        adder.add(&IoDetail::write("1.2.3.4", 50, 2));

        let snap = adder.snapshot();
        assert_eq!(snap.read_count, 1);
        assert_eq!(snap.read_bytes, 100);
        assert_eq!(snap.read_time_ms, 5);
        assert_eq!(snap.write_count, 1);
        assert_eq!(snap.write_bytes, 50);
        assert_eq!(snap.write_time_ms, 2);
        assert_eq!(snap.addresses, vec!["1.2.3.4".to_string()]);
    }

    #[test]
    fn test_to_line_matches_documented_record_grammar() {
        let adder = IoDetailAdder::new();
        adder.add(&IoDetail::read("1.2.3.4", 100, 5));
        adder.add(&IoDetail::write("1.2.3.4", 50, 2));

        assert_eq!(
            adder.to_line(),
            "1 read ops 100 bytes in 5 ms, 1 write ops 50 bytes in 2 ms: [1.2.3.4]"
        );
    }

    #[test]
    fn test_addresses_are_sorted_and_deduplicated() {
        let adder = IoDetailAdder::new();
        adder.add(&IoDetail::read("9.9.9.9", 1, 1));
        adder.add(&IoDetail::read("1.1.1.1", 1, 1));
        adder.add(&IoDetail::read("9.9.9.9", 1, 1));

        assert_eq!(
            adder.snapshot().addresses,
            vec!["1.1.1.1".to_string(), "9.9.9.9".to_string()]
        );
        assert!(adder.to_line().ends_with("[1.1.1.1, 9.9.9.9]"));
    }

    #[test]
    fn test_merge_unions_addresses_and_sums_counters() {
        let a = IoDetailAdder::new();
        a.add(&IoDetail::read("1.2.3.4", 100, 5));
        let b = IoDetailAdder::new();
        b.add(&IoDetail::write("5.6.7.8", 50, 2));
        b.add(&IoDetail::read("1.2.3.4", 10, 1));

        a.merge(&b);
        let snap = a.snapshot();
        assert_eq!(snap.read_count, 2);
        assert_eq!(snap.read_bytes, 110);
        assert_eq!(snap.read_time_ms, 6);
        assert_eq!(snap.write_count, 1);
        assert_eq!(snap.addresses, vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()]);
    }

    #[test]
    fn test_merge_order_does_not_change_totals() {
        let events = [
            IoDetail::read("1.2.3.4", 100, 5),
            IoDetail::write("5.6.7.8", 50, 2),
            IoDetail::read("9.9.9.9", 7, 1),
        ];

        // (a ⊔ b) ⊔ c
        let left = IoDetailAdder::new();
        for ev in &events[..2] {
            left.add(ev);
        }
        let c = IoDetailAdder::new();
        c.add(&events[2]);
        left.merge(&c);

        // a ⊔ (c ⊔ b)
        let right = IoDetailAdder::new();
        right.add(&events[0]);
        let cb = IoDetailAdder::new();
        cb.add(&events[2]);
        cb.add(&events[1]);
        right.merge(&cb);

        assert_eq!(left.snapshot(), right.snapshot());
    }

    #[test]
    fn test_round_trip_reproduces_state() {
        let adder = IoDetailAdder::new();
        adder.add(&IoDetail::read("10.0.0.5", 4096, 12));
        adder.add(&IoDetail::write("10.0.0.5", 128, 3));
        adder.add(&IoDetail::read("192.168.1.9", 77, 1));

        let restored = IoDetailAdder::from_line(&adder.to_line()).unwrap();
        assert_eq!(restored.snapshot(), adder.snapshot());
    }

    #[test]
    fn test_round_trip_with_no_addresses() {
        let adder = IoDetailAdder::new();
        assert_eq!(adder.to_line(), "0 read ops 0 bytes in 0 ms, 0 write ops 0 bytes in 0 ms: []");

        let restored = IoDetailAdder::from_line(&adder.to_line()).unwrap();
        assert!(restored.snapshot().addresses.is_empty());
        assert_eq!(restored.snapshot(), adder.snapshot());
    }

    #[test]
    fn test_set_from_line_resets_previous_state() {
        let adder = IoDetailAdder::new();
        adder.add(&IoDetail::read("9.9.9.9", 999, 9));

        adder
            .set_from_line("1 read ops 100 bytes in 5 ms, 0 write ops 0 bytes in 0 ms: [1.2.3.4]")
            .unwrap();

        let snap = adder.snapshot();
        assert_eq!(snap.read_count, 1);
        assert_eq!(snap.read_bytes, 100);
        assert_eq!(snap.addresses, vec!["1.2.3.4".to_string()]);
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        let err = IoDetailAdder::from_line("1 read ops 100 bytes: [1.2.3.4]").unwrap_err();
        assert!(matches!(err, StatsParseError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_non_numeric_counter() {
        let err = IoDetailAdder::from_line(
            "x read ops 100 bytes in 5 ms, 0 write ops 0 bytes in 0 ms: []",
        )
        .unwrap_err();
        assert_eq!(err, StatsParseError::NonNumeric { field: "read ops", value: "x".to_string() });
    }

    #[test]
    fn test_parse_rejects_missing_bracket() {
        let err =
            IoDetailAdder::from_line("1 read ops 1 bytes in 1 ms, 0 write ops 0 bytes in 0 ms: [x")
                .unwrap_err();
        assert!(matches!(err, StatsParseError::Malformed(_)));
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() {
        use std::sync::Arc;
        use std::thread;

        let adder = Arc::new(IoDetailAdder::new());
        let mut handles = Vec::new();

        for t in 0..4 {
            let adder = Arc::clone(&adder);
            handles.push(thread::spawn(move || {
                let event = IoDetail::read(format!("10.0.0.{t}"), 100, 5);
                for _ in 0..1000 {
                    adder.add(&event);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("thread panicked");
        }

        let snap = adder.snapshot();
        assert_eq!(snap.read_count, 4000);
        assert_eq!(snap.read_bytes, 400_000);
        assert_eq!(snap.read_time_ms, 20_000);
        assert_eq!(snap.addresses.len(), 4);
    }
}
