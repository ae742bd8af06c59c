//! Text rendering shared by the console and line-file sinks

use std::fmt::Write as _;

use chrono::{DateTime, Local, Timelike};

use crate::error::WriteError;
use crate::event::{AttributeValue, EventRecord};
use crate::transaction::FlushedTransaction;

/// Timestamp layout for text output, before the fractional seconds
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix of each event line inside a transaction block
pub const TRANSACTION_LINE_PREFIX: &str = "--> ";

/// `YYYY-MM-DD HH:MM:SS.ffff`, fraction truncated to four digits
pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    // nanosecond() exceeds 10^9 during a leap second
    let ten_thousandths = (ts.nanosecond() % 1_000_000_000) / 100_000;
    format!("{}.{:04}", ts.format(TIMESTAMP_FORMAT), ten_thousandths)
}

/// Render `[timestamp] [level] message [k=v]...` into `out`, without newline
///
/// Stops at the first unsupported attribute, leaving the partial line in
/// `out`.
pub fn render_event(out: &mut String, event: &EventRecord) -> Result<(), WriteError> {
    let _ = write!(
        out,
        "[{}] [{}] {}",
        format_timestamp(&event.timestamp()),
        event.level(),
        event.message()
    );

    for (name, value) in event.attributes().iter() {
        match value {
            AttributeValue::Int(v) => {
                let _ = write!(out, " [{}={}]", name, v);
            }
            AttributeValue::Float(v) if v.is_finite() => {
                let _ = write!(out, " [{}={:.6}]", name, v);
            }
            AttributeValue::Str(v) => {
                let _ = write!(out, " [{}={}]", name, v);
            }
            AttributeValue::Float(_) | AttributeValue::Bool(_) => {
                return Err(WriteError::unsupported(name, value.type_name()));
            }
        }
    }

    Ok(())
}

/// Render one event as a full line; the newline is present even on error
pub fn render_line(event: &EventRecord) -> (String, Result<(), WriteError>) {
    let mut line = String::new();
    let result = render_event(&mut line, event);
    line.push('\n');
    (line, result)
}

/// Render a flushed transaction as a banner-framed text block
///
/// Every event is rendered; the first formatting error is returned
/// alongside the complete block.
pub fn render_transaction(txn: &FlushedTransaction) -> (String, Result<(), WriteError>) {
    let mut block = String::new();
    let mut first_error = None;

    let _ = writeln!(
        block,
        "[{}] [transaction] {} started",
        format_timestamp(&txn.start_timestamp),
        txn.transaction_id
    );

    for event in &txn.transaction_logs {
        block.push_str(TRANSACTION_LINE_PREFIX);
        if let Err(e) = render_event(&mut block, event) {
            first_error.get_or_insert(e);
        }
        block.push('\n');
    }

    let _ = writeln!(
        block,
        "[{}] [transaction] {} ended ({} events)",
        format_timestamp(&txn.end_timestamp),
        txn.transaction_id,
        txn.transaction_logs.len()
    );

    (block, first_error.map_or(Ok(()), Err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Attributes;
    use crate::level::Level;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_has_four_fractional_digits() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_nano_opt(12, 0, 5, 123_456_789)
            .unwrap()
            .and_local_timezone(Local)
            .single()
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-10 12:00:05.1234");

        let whole = ts.with_nanosecond(0).unwrap();
        assert_eq!(format_timestamp(&whole), "2024-03-10 12:00:05.0000");
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_render_supported_attributes() {
        let attrs = Attributes::new()
            .with("varInt", 0)
            .with("varStr", "x")
            .with("varFloat", 3.14);
        let event = EventRecord::new(Level::Info, "test", attrs);

        let (line, result) = render_line(&event);
        assert!(result.is_ok());
        assert!(line.starts_with(&format!(
            "[{}] [info] test",
            format_timestamp(&event.timestamp())
        )));
        assert!(line.ends_with(" [varInt=0] [varStr=x] [varFloat=3.140000]\n"));
    }

    #[test]
    fn test_render_unsupported_still_terminates_line() {
        let attrs = Attributes::new().with("before", 1).with("flag", true).with("after", 2);
        let event = EventRecord::new(Level::Warning, "partial", attrs);

        let (line, result) = render_line(&event);
        assert!(matches!(
            result,
            Err(WriteError::UnsupportedAttributeType { ref name, .. }) if name == "flag"
        ));
        assert!(line.ends_with("partial [before=1]\n"));
        assert!(!line.contains("after"));
    }

    #[test]
    fn test_render_non_finite_float_is_unsupported() {
        let attrs = Attributes::new().with("ok", 1.5).with("ratio", f64::NAN);
        let event = EventRecord::new(Level::Info, "nan", attrs);

        let (line, result) = render_line(&event);
        assert!(matches!(
            result,
            Err(WriteError::UnsupportedAttributeType { ref name, .. }) if name == "ratio"
        ));
        assert!(line.ends_with("nan [ok=1.500000]\n"));
    }

    #[test]
    fn test_render_transaction_block() {
        let start = Local::now();
        let txn = FlushedTransaction {
            transaction_id: "tx-42".to_string(),
            start_timestamp: start,
            end_timestamp: start,
            transaction_logs: vec![
                EventRecord::new(Level::Info, "first", Attributes::new()),
                EventRecord::new(Level::Error, "second", Attributes::new().with("n", 2)),
            ],
        };

        let (block, result) = render_transaction(&txn);
        assert!(result.is_ok());

        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("[transaction] tx-42 started"));
        assert!(lines[1].starts_with("--> ["));
        assert!(lines[1].ends_with("[info] first"));
        assert!(lines[2].ends_with("[error] second [n=2]"));
        assert!(lines[3].ends_with("[transaction] tx-42 ended (2 events)"));
    }

    #[test]
    fn test_render_transaction_continues_after_bad_event() {
        let now = Local::now();
        let txn = FlushedTransaction {
            transaction_id: "tx".to_string(),
            start_timestamp: now,
            end_timestamp: now,
            transaction_logs: vec![
                EventRecord::new(Level::Info, "bad", Attributes::new().with("flag", false)),
                EventRecord::new(Level::Info, "good", Attributes::new()),
            ],
        };

        let (block, result) = render_transaction(&txn);
        assert!(matches!(
            result,
            Err(WriteError::UnsupportedAttributeType { .. })
        ));
        assert!(block.contains("[info] bad\n"));
        assert!(block.contains("[info] good\n"));
        assert!(block.ends_with("ended (2 events)\n"));
    }
}
