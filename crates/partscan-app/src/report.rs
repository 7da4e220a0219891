// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result rows: each input row's extra columns followed by the validation
// columns, with ASCII control characters stripped from every string cell.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use partscan_core::error::Result;
use partscan_core::{StatusKind, ValidationOutcome};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::input::InputRow;

pub const COLUMN_IDENTIFIER: &str = "MPN";
pub const COLUMN_LOCATION: &str = "PDF";
pub const COLUMN_STATUS: &str = "STATUS";
pub const COLUMN_EQUIVALENT: &str = "EQUIVALENT";
pub const COLUMN_SIMILARS: &str = "SIMILARS";

/// Remove `\x00`–`\x1F` and `\x7F`. Newlines and tabs go too.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}'))
        .collect()
}

/// One output object per row, pairing `rows[i]` with `outcomes[i]`.
pub fn build_records(
    rows: &[InputRow],
    outcomes: &[ValidationOutcome],
    similars_delimiter: &str,
) -> Vec<Value> {
    rows.iter()
        .zip(outcomes)
        .map(|(row, outcome)| {
            let mut record: Map<String, Value> = row
                .extra
                .iter()
                .map(|(key, value)| (key.clone(), sanitize_value(value)))
                .collect();

            record.insert(
                COLUMN_IDENTIFIER.into(),
                Value::String(sanitize(row.request.identifier())),
            );
            record.insert(
                COLUMN_LOCATION.into(),
                Value::String(sanitize(row.request.location().as_str())),
            );
            record.insert(
                COLUMN_STATUS.into(),
                Value::String(outcome.status().label().to_string()),
            );
            record.insert(COLUMN_EQUIVALENT.into(), optional(outcome.equivalent()));
            record.insert(
                COLUMN_SIMILARS.into(),
                optional(outcome.similars_joined(similars_delimiter).as_deref()),
            );
            Value::Object(record)
        })
        .collect()
}

/// Write `records` as a pretty-printed JSON array.
#[instrument(skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_report(path: &Path, records: &[Value]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("report written");
    Ok(())
}

/// Row count per status, in display order.
pub fn status_counts(outcomes: &[ValidationOutcome]) -> Vec<(StatusKind, usize)> {
    StatusKind::ALL
        .iter()
        .map(|status| {
            let count = outcomes.iter().filter(|o| o.status() == *status).count();
            (*status, count)
        })
        .collect()
}

/// Log the per-status summary of a run.
pub fn log_summary(outcomes: &[ValidationOutcome]) {
    for (status, count) in status_counts(outcomes) {
        info!(status = status.label(), count, "status summary");
    }
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::String(sanitize(text)))
}

fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(sanitize(text)),
        other => other.clone(),
    }
}
