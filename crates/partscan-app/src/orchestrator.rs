// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-phase validation pipeline.
//
// Phase one turns every distinct document location into text: locations are
// fetched batch by batch, and each fetched document is extracted (with OCR
// when its text layer is too short) before the next batch starts. Phase two
// classifies every request row against the finished, read-only map.
//
// Per-document failures never escape a phase: a location that cannot be
// fetched or parsed is simply missing from the map, and every row pointing at
// it comes out Unavailable.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use partscan_core::error::{PartscanError, Result};
use partscan_core::{
    DocumentLocation, ExtractedText, ExtractionMap, ValidationConfig, ValidationOutcome,
    ValidationRequest,
};
use partscan_document::{OcrFallbackExtractor, TextExtractor, TextRecognizer, needs_ocr, ocrs_factory};
use partscan_fetch::DocumentFetcher;
use partscan_match::PartNumberMatcher;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Owns everything one validation run needs, including the OCR engine.
pub struct ValidationOrchestrator {
    config: ValidationConfig,
    fetcher: DocumentFetcher,
    digital: TextExtractor,
    ocr: Arc<OcrFallbackExtractor>,
    matcher: PartNumberMatcher,
}

impl ValidationOrchestrator {
    /// OCR uses the `ocrs` models from `config.ocr_model_dir`, loaded on the
    /// first scanned document.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        let factory = ocrs_factory(config.ocr_model_dir.clone());
        Self::with_ocr(config, OcrFallbackExtractor::new(factory))
    }

    /// Use `recognizer` for every OCR call instead of loading models.
    pub fn with_recognizer(
        config: ValidationConfig,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Result<Self> {
        Self::with_ocr(config, OcrFallbackExtractor::with_recognizer(recognizer))
    }

    fn with_ocr(config: ValidationConfig, ocr: OcrFallbackExtractor) -> Result<Self> {
        config.validate()?;
        let fetcher = DocumentFetcher::new(&config.fetch_config())?;
        let matcher = PartNumberMatcher::from_config(&config);
        Ok(Self {
            config,
            fetcher,
            digital: TextExtractor,
            ocr: Arc::new(ocr),
            matcher,
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// One outcome per request, in request order.
    #[instrument(skip_all, fields(rows = requests.len()))]
    pub async fn run(&self, requests: &[ValidationRequest]) -> Vec<ValidationOutcome> {
        let locations: Vec<DocumentLocation> =
            requests.iter().map(|r| r.location().clone()).collect();

        let map = self.build_extraction_map(&locations).await;
        info!(
            documents = map.len(),
            "extraction phase complete, matching rows"
        );

        self.match_all(requests, Arc::new(map)).await
    }

    /// Fetch and extract every distinct location, `fetch_batch_size` at a time.
    ///
    /// Locations that could not be fetched or parsed have no entry.
    #[instrument(skip_all, fields(requested = locations.len()))]
    pub async fn build_extraction_map(&self, locations: &[DocumentLocation]) -> ExtractionMap {
        let unique = unique_in_order(locations);
        let batch_size = self.config.fetch_batch_size.max(1);
        let total_batches = unique.len().div_ceil(batch_size);

        let mut map = ExtractionMap::with_capacity(unique.len());
        for (batch_index, batch) in unique.chunks(batch_size).enumerate() {
            info!(
                batch = batch_index + 1,
                total_batches,
                locations = batch.len(),
                "processing batch"
            );

            let documents = self.fetcher.fetch_batch(batch).await;
            let extractions = documents.into_iter().map(|(location, bytes)| async move {
                let text = self.extract_location(&location, bytes).await;
                (location, text)
            });

            for (location, text) in join_all(extractions).await {
                if let Some(text) = text {
                    map.insert(location, text);
                }
            }
        }

        info!(
            readable = map.len(),
            unreadable = unique.len() - map.len(),
            "extraction map built"
        );
        map
    }

    /// Text for one fetched document.
    ///
    /// `None` when the bytes are not a readable PDF (or extraction timed out).
    /// When the digital text is short enough to suggest a scan, the OCR result
    /// replaces it, even if OCR recovered nothing.
    #[instrument(skip_all, fields(location = %location, bytes_len = bytes.len()))]
    pub async fn extract_location(
        &self,
        location: &DocumentLocation,
        bytes: Vec<u8>,
    ) -> Option<ExtractedText> {
        let bytes = Arc::new(bytes);

        let digital = {
            let extractor = self.digital;
            let bytes = Arc::clone(&bytes);
            run_blocking("text extraction", self.config.extract_timeout(), move || {
                extractor.extract(bytes.as_slice())
            })
            .await
        };
        let digital = match digital {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "document unreadable");
                return None;
            }
        };

        if !needs_ocr(&digital, self.config.ocr_trigger_chars) {
            return Some(ExtractedText::digital(digital));
        }

        debug!(chars = digital.chars().count(), "text layer too short, running OCR");
        let ocr = Arc::clone(&self.ocr);
        let recognised = run_blocking("OCR", self.config.ocr_timeout(), move || {
            Ok(ocr.extract(bytes.as_slice()))
        })
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "OCR abandoned, using empty text");
            String::new()
        });

        Some(ExtractedText::ocr(recognised))
    }

    /// Classify every request against `map`, at most `match_workers` at once.
    #[instrument(skip_all, fields(rows = requests.len()))]
    pub async fn match_all(
        &self,
        requests: &[ValidationRequest],
        map: Arc<ExtractionMap>,
    ) -> Vec<ValidationOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.match_workers.max(1)));
        let mut handles = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    error!(row = index, error = %err, "match worker pool closed");
                    break;
                }
            };
            let map = Arc::clone(&map);
            let matcher = self.matcher;
            let request = request.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let text = map.get(request.location()).map(|entry| entry.text.as_str());
                (index, matcher.classify(request.identifier(), text))
            }));
        }

        let mut slots: Vec<Option<ValidationOutcome>> = vec![None; requests.len()];
        for handle in handles {
            match handle.await {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(err) => error!(error = %err, "match task failed"),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    error!(row = index, "row produced no outcome, reporting it as unavailable");
                    ValidationOutcome::unavailable()
                })
            })
            .collect()
    }
}

/// Distinct locations, first occurrence first.
fn unique_in_order(locations: &[DocumentLocation]) -> Vec<DocumentLocation> {
    let mut seen = HashSet::with_capacity(locations.len());
    locations
        .iter()
        .filter(|location| seen.insert(*location))
        .cloned()
        .collect()
}

/// Run CPU-bound `work` off the async runtime with a wall-clock limit.
///
/// On timeout the blocking thread is abandoned; its eventual result is dropped.
async fn run_blocking<T, F>(stage: &'static str, limit: Duration, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(PartscanError::Worker(format!("{stage} task failed: {join_err}"))),
        Err(_) => Err(PartscanError::Timeout {
            stage,
            secs: limit.as_secs(),
        }),
    }
}
