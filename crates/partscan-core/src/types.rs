// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the partscan validator.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{PartscanError, Result};

/// Where a document is fetched from (normally an HTTP URL).
///
/// Compared as an exact string: two spellings of the same URL are two
/// different locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentLocation(String);

impl DocumentLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentLocation {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How the text for a location was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// Native text layer of the PDF.
    Digital,
    /// Optical recognition of the rendered pages.
    Ocr,
}

/// Text recovered from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
}

impl ExtractedText {
    pub fn digital(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            method: ExtractionMethod::Digital,
        }
    }

    pub fn ocr(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            method: ExtractionMethod::Ocr,
        }
    }
}

/// Location → text for every document that could be read. Built once per run
/// and read-only afterwards.
pub type ExtractionMap = HashMap<DocumentLocation, ExtractedText>;

/// One input row: look for `identifier` inside the document at `location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    identifier: String,
    location: DocumentLocation,
}

impl ValidationRequest {
    /// Build a request, rejecting blank identifiers or locations.
    ///
    /// `row` is only used to label the error.
    pub fn new(row: usize, identifier: impl Into<String>, location: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        let location = location.into();
        if identifier.trim().is_empty() {
            return Err(PartscanError::InvalidRow {
                row,
                reason: "identifier is empty".into(),
            });
        }
        if location.trim().is_empty() {
            return Err(PartscanError::InvalidRow {
                row,
                reason: "document location is empty".into(),
            });
        }
        Ok(Self {
            identifier,
            location: DocumentLocation::new(location),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn location(&self) -> &DocumentLocation {
        &self.location
    }
}

/// Result classification for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusKind {
    /// The identifier occurs verbatim (ignoring case).
    #[serde(rename = "Exact")]
    Exact,
    /// A token is similar enough to the identifier.
    #[serde(rename = "Includes or Missed Suffixes")]
    PartialMatch,
    /// Text was available but nothing matched.
    #[serde(rename = "Not Found")]
    NotFound,
    /// No text exists for the location (fetch or parse failed).
    #[serde(rename = "May be Broken")]
    Unavailable,
}

impl StatusKind {
    pub const ALL: [StatusKind; 4] = [
        StatusKind::Exact,
        StatusKind::PartialMatch,
        StatusKind::NotFound,
        StatusKind::Unavailable,
    ];

    /// External label written to reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::PartialMatch => "Includes or Missed Suffixes",
            Self::NotFound => "Not Found",
            Self::Unavailable => "May be Broken",
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome for one request.
///
/// `equivalent` is only ever set for `Exact` and `PartialMatch`, `similars`
/// only for `Exact`; the constructors are the sole way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    status: StatusKind,
    equivalent: Option<String>,
    similars: Option<BTreeSet<String>>,
}

impl ValidationOutcome {
    /// Verbatim hit. An empty `similars` set is stored as `None`.
    pub fn exact(equivalent: impl Into<String>, similars: BTreeSet<String>) -> Self {
        Self {
            status: StatusKind::Exact,
            equivalent: Some(equivalent.into()),
            similars: (!similars.is_empty()).then_some(similars),
        }
    }

    pub fn partial(equivalent: impl Into<String>) -> Self {
        Self {
            status: StatusKind::PartialMatch,
            equivalent: Some(equivalent.into()),
            similars: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusKind::NotFound,
            equivalent: None,
            similars: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: StatusKind::Unavailable,
            equivalent: None,
            similars: None,
        }
    }

    pub fn status(&self) -> StatusKind {
        self.status
    }

    pub fn equivalent(&self) -> Option<&str> {
        self.equivalent.as_deref()
    }

    pub fn similars(&self) -> Option<&BTreeSet<String>> {
        self.similars.as_ref()
    }

    /// Similars rendered as one delimiter-separated string.
    pub fn similars_joined(&self, delimiter: &str) -> Option<String> {
        self.similars.as_ref().map(|set| {
            set.iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(delimiter)
        })
    }
}
