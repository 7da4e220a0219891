// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input rows: a JSON array of objects, one per part to validate.
//
// The identifier column is `identifier` or `MPN`, the document column
// `location` or `PDF`. Every other column is carried through untouched so the
// report can echo it.

use std::path::Path;

use partscan_core::ValidationRequest;
use partscan_core::error::{PartscanError, Result};
use serde_json::{Map, Number, Value};
use tracing::{info, instrument};

/// Accepted names for the identifier column, in priority order.
pub const IDENTIFIER_COLUMNS: [&str; 2] = ["identifier", "MPN"];
/// Accepted names for the document location column, in priority order.
pub const LOCATION_COLUMNS: [&str; 2] = ["location", "PDF"];

/// One parsed input row.
#[derive(Debug, Clone)]
pub struct InputRow {
    pub request: ValidationRequest,
    /// Columns other than the identifier and location, in file order.
    pub extra: Map<String, Value>,
}

/// Read and validate every row of the file at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_rows(path: &Path) -> Result<Vec<InputRow>> {
    let raw = std::fs::read_to_string(path)?;
    let rows = parse_rows(&raw)?;
    info!(rows = rows.len(), "input loaded");
    Ok(rows)
}

/// Parse a JSON array of row objects. Any invalid row fails the whole input,
/// and the error names every invalid row, numbered from 1.
pub fn parse_rows(raw: &str) -> Result<Vec<InputRow>> {
    let values: Vec<Value> = serde_json::from_str(raw)?;

    let mut rows = Vec::with_capacity(values.len());
    let mut invalid = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match parse_row(index + 1, value) {
            Ok(row) => rows.push(row),
            Err(PartscanError::InvalidRow { row, reason }) => invalid.push((row, reason)),
            Err(other) => return Err(other),
        }
    }

    if invalid.len() == 1 {
        let (row, reason) = invalid.remove(0);
        return Err(PartscanError::InvalidRow { row, reason });
    }
    if !invalid.is_empty() {
        let details = invalid
            .iter()
            .map(|(row, reason)| format!("row {row}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PartscanError::InvalidRows {
            rows: invalid.into_iter().map(|(row, _)| row).collect(),
            details,
        });
    }
    Ok(rows)
}

fn parse_row(row: usize, value: Value) -> Result<InputRow> {
    let Value::Object(fields) = value else {
        return Err(PartscanError::InvalidRow {
            row,
            reason: "expected a JSON object".into(),
        });
    };

    let identifier = cell(row, &fields, &IDENTIFIER_COLUMNS)?;
    let location = cell(row, &fields, &LOCATION_COLUMNS)?;
    let request = ValidationRequest::new(row, identifier, location)?;

    let extra = fields
        .into_iter()
        .filter(|(key, _)| {
            !IDENTIFIER_COLUMNS.contains(&key.as_str()) && !LOCATION_COLUMNS.contains(&key.as_str())
        })
        .collect();

    Ok(InputRow { request, extra })
}

/// Text of the first present column among `names`. Numbers are accepted;
/// whole-valued floats lose their `.0` so `74123.0` reads as `74123`.
fn cell(row: usize, fields: &Map<String, Value>, names: &[&str]) -> Result<String> {
    let found = names
        .iter()
        .find_map(|name| fields.get(*name).filter(|value| !value.is_null()));

    match found {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number_text(number)),
        Some(other) => Err(PartscanError::InvalidRow {
            row,
            reason: format!("`{}` must be a string or number, got {other}", names.join("`/`")),
        }),
        None => Err(PartscanError::InvalidRow {
            row,
            reason: format!("missing `{}` column", names.join("` or `")),
        }),
    }
}

fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(value) if number.is_f64() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{value:.0}")
        }
        _ => number.to_string(),
    }
}
