// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Validation run configuration.
//
// Every tunable of the pipeline lives here so nothing is hardcoded out of
// sight. Values come from `Default`, optionally overlaid by a TOML file, and
// finally by command-line flags in the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PartscanError, Result};

/// Digital text at or below this many characters is treated as a scan.
pub const DEFAULT_OCR_TRIGGER_CHARS: usize = 100;
/// Minimum similarity ratio for a fuzzy token match.
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.65;
/// Number of locations fetched and extracted before the next batch starts.
pub const DEFAULT_FETCH_BATCH_SIZE: usize = 100;
/// Per-request HTTP timeout.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Settings for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Digital text with at most this many characters triggers OCR.
    pub ocr_trigger_chars: usize,
    /// Fuzzy-match acceptance cutoff in `[0, 1]`.
    pub fuzzy_cutoff: f64,
    /// Locations per fetch batch.
    pub fetch_batch_size: usize,
    /// Upper bound on in-flight HTTP requests within a batch.
    pub max_concurrent_fetches: usize,
    /// HTTP timeout per document, in seconds.
    pub fetch_timeout_secs: u64,
    /// Wall-clock budget for digital text extraction of one document.
    pub extract_timeout_secs: u64,
    /// Wall-clock budget for OCR of one document.
    pub ocr_timeout_secs: u64,
    /// Parallel matching tasks.
    pub match_workers: usize,
    /// Separator used when rendering the similars set.
    pub similars_delimiter: String,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    /// `None` uses the ocrs cache directory.
    pub ocr_model_dir: Option<PathBuf>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ocr_trigger_chars: DEFAULT_OCR_TRIGGER_CHARS,
            fuzzy_cutoff: DEFAULT_FUZZY_CUTOFF,
            fetch_batch_size: DEFAULT_FETCH_BATCH_SIZE,
            max_concurrent_fetches: DEFAULT_FETCH_BATCH_SIZE,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            extract_timeout_secs: 60,
            ocr_timeout_secs: 300,
            match_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            similars_delimiter: "|".to_string(),
            ocr_model_dir: None,
        }
    }
}

impl ValidationConfig {
    /// Load settings from an optional TOML file; missing keys keep defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str::<Self>(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_cutoff) {
            return Err(PartscanError::Config(format!(
                "fuzzy_cutoff must be within [0, 1], got {}",
                self.fuzzy_cutoff
            )));
        }
        if self.fetch_batch_size == 0 {
            return Err(PartscanError::Config(
                "fetch_batch_size must be at least 1".into(),
            ));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(PartscanError::Config(
                "max_concurrent_fetches must be at least 1".into(),
            ));
        }
        for (name, secs) in [
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("extract_timeout_secs", self.extract_timeout_secs),
            ("ocr_timeout_secs", self.ocr_timeout_secs),
        ] {
            if secs == 0 {
                return Err(PartscanError::Config(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        if self.match_workers == 0 {
            return Err(PartscanError::Config(
                "match_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }

    /// The subset of settings the HTTP fetcher needs.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: self.fetch_timeout(),
            max_concurrent: self.max_concurrent_fetches,
        }
    }
}

/// HTTP fetcher settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        ValidationConfig::default().fetch_config()
    }
}
