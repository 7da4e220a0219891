// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for partscan.

use thiserror::Error;

/// Top-level error type for all partscan operations.
#[derive(Debug, Error)]
pub enum PartscanError {
    // -- Fetch errors --
    #[error("fetching {location} failed: {reason}")]
    Fetch { location: String, reason: String },

    #[error("fetching {location} returned HTTP {status}")]
    HttpStatus { location: String, status: u16 },

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image decoding failed: {0}")]
    ImageError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("worker task failed: {0}")]
    Worker(String),

    // -- Input boundary --
    #[error("row {row} is invalid: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("{} rows are invalid: {details}", .rows.len())]
    InvalidRows { rows: Vec<usize>, details: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PartscanError>;
