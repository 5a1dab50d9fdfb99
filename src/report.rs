//! Plain-text and JSON rendering of fetch results

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::aggregator::Summary;
use crate::error::Result;
use crate::types::FetchRecord;

/// One fetched resource as written to a JSON report (payload omitted)
#[derive(Debug, Serialize)]
struct ReportEntry<'a> {
    resource: &'a str,
    elapsed_ms: u64,
    size_bytes: usize,
    started_at: DateTime<Utc>,
}

impl<'a> From<&'a FetchRecord> for ReportEntry<'a> {
    fn from(record: &'a FetchRecord) -> Self {
        Self {
            resource: record.resource().as_str(),
            elapsed_ms: record.elapsed_ms(),
            size_bytes: record.payload().len(),
            started_at: record.started_at(),
        }
    }
}

/// Format one record as `<url>, <ms>(ms) <kb>(KB)`
pub fn format_record(record: &FetchRecord) -> String {
    format!(
        "{}, {}(ms) {}(KB)",
        record.resource(),
        record.elapsed_ms(),
        record.size_kb()
    )
}

/// Write one line per record, in the given order
pub fn write_report<W: Write>(writer: &mut W, records: &[FetchRecord]) -> Result<()> {
    for record in records {
        writeln!(writer, "{}", format_record(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one JSON object per record, followed by the summary if given
pub fn write_json_report<W: Write>(
    writer: &mut W,
    records: &[FetchRecord],
    summary: Option<&Summary>,
) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *writer, &ReportEntry::from(record))?;
        writer.write_all(b"\n")?;
    }

    if let Some(summary) = summary {
        serde_json::to_writer(&mut *writer, &serde_json::json!({ "summary": summary }))?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}
