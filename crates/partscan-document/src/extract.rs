// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The two text extractors the validation pipeline drives.
//
// `TextExtractor` reads the native text layer and fails only when the bytes
// are not a readable PDF. `OcrFallbackExtractor` rasterizes pages and runs the
// shared recognizer; it never fails, an empty string stands for "nothing
// recovered".

use std::sync::{Arc, OnceLock};

use partscan_core::error::{PartscanError, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::pdf::raster;
use crate::pdf::reader::PdfReader;
use crate::scan::recognizer::{RecognizerFactory, TextRecognizer};

/// Whether digital text this short should be replaced by OCR output.
///
/// Length is counted in characters, not bytes.
pub fn needs_ocr(digital_text: &str, trigger_chars: usize) -> bool {
    digital_text.chars().count() <= trigger_chars
}

/// Native text-layer extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Page texts in page order, joined by newlines.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn extract(&self, bytes: &[u8]) -> Result<String> {
        let reader = PdfReader::from_bytes(bytes)?;
        Ok(reader.text_layer())
    }
}

/// OCR extraction with a lazily built, shared recognizer.
///
/// The recognizer is constructed by the first call that needs it; concurrent
/// callers wait on that single construction. A failed construction is
/// remembered, so the models are not reloaded for every document.
pub struct OcrFallbackExtractor {
    factory: RecognizerFactory,
    engine: OnceLock<Option<Arc<dyn TextRecognizer>>>,
}

impl OcrFallbackExtractor {
    pub fn new(factory: RecognizerFactory) -> Self {
        Self {
            factory,
            engine: OnceLock::new(),
        }
    }

    /// Use an already constructed recognizer.
    pub fn with_recognizer(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self::new(Box::new(move || Ok(Arc::clone(&recognizer))))
    }

    /// Whether construction has been attempted.
    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    fn engine(&self) -> Option<&Arc<dyn TextRecognizer>> {
        self.engine
            .get_or_init(|| match (self.factory)() {
                Ok(engine) => {
                    info!("OCR recognizer ready");
                    Some(engine)
                }
                Err(err) => {
                    error!(error = %err, "OCR recognizer unavailable, scanned documents will yield no text");
                    None
                }
            })
            .as_ref()
    }

    /// Recognised text of every page, or `""` on any failure.
    pub fn extract(&self, bytes: &[u8]) -> String {
        match self.try_extract(bytes) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "OCR extraction failed, using empty text");
                String::new()
            }
        }
    }

    /// Fragments within a page are joined by spaces, pages by newlines, and
    /// the result is trimmed.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn try_extract(&self, bytes: &[u8]) -> Result<String> {
        let reader = PdfReader::from_bytes(bytes)?;
        let engine = self
            .engine()
            .ok_or_else(|| PartscanError::OcrError("no recognizer available".into()))?;

        let mut page_texts = Vec::with_capacity(reader.page_count());
        for page_number in reader.page_numbers() {
            let mut fragments = Vec::new();
            for image in raster::page_images(&reader, page_number)? {
                fragments.extend(engine.recognize_fragments(&image)?);
            }
            debug!(page_number, fragments = fragments.len(), "page OCR done");
            page_texts.push(fragments.join(" "));
        }

        Ok(page_texts.join("\n").trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns fixed fragments for every page and counts calls.
    struct ScriptedRecognizer {
        fragments: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize_fragments(&self, _page: &DynamicImage) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.fragments.iter().map(|s| s.to_string()).collect())
        }
    }

    struct BrokenRecognizer;

    impl TextRecognizer for BrokenRecognizer {
        fn recognize_fragments(&self, _page: &DynamicImage) -> Result<Vec<String>> {
            Err(PartscanError::OcrError("model exploded".into()))
        }
    }

    #[test]
    fn trigger_is_inclusive_and_counts_chars() {
        assert!(needs_ocr("", 100));
        assert!(needs_ocr(&"a".repeat(100), 100));
        assert!(!needs_ocr(&"a".repeat(101), 100));
        // 60 two-byte characters: 120 bytes but only 60 chars.
        assert!(needs_ocr(&"é".repeat(60), 100));
    }

    #[test]
    fn digital_extraction_reads_text_layer() {
        let bytes = fixtures::text_pdf(&["Rev2 ABC-123 datasheet"]);
        let text = TextExtractor.extract(&bytes).unwrap();
        assert!(text.contains("ABC-123"), "got {text:?}");
    }

    #[test]
    fn digital_extraction_rejects_garbage() {
        assert!(TextExtractor.extract(b"<html>404</html>").is_err());
    }

    #[test]
    fn ocr_joins_fragments_and_pages() {
        let recognizer = Arc::new(ScriptedRecognizer {
            fragments: vec!["PART", "ABC-123"],
            calls: AtomicUsize::new(0),
        });
        let extractor = OcrFallbackExtractor::with_recognizer(recognizer.clone());

        let text = extractor.extract(&fixtures::scanned_pdf(2));
        assert_eq!(text, "PART ABC-123\nPART ABC-123");
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ocr_result_is_trimmed() {
        let recognizer = Arc::new(ScriptedRecognizer {
            fragments: vec!["  padded  "],
            calls: AtomicUsize::new(0),
        });
        let extractor = OcrFallbackExtractor::with_recognizer(recognizer);
        assert_eq!(extractor.extract(&fixtures::scanned_pdf(1)), "padded");
    }

    #[test]
    fn ocr_failure_yields_empty_text() {
        let extractor = OcrFallbackExtractor::with_recognizer(Arc::new(BrokenRecognizer));
        assert_eq!(extractor.extract(&fixtures::scanned_pdf(1)), "");
        assert!(extractor.try_extract(&fixtures::scanned_pdf(1)).is_err());
    }

    #[test]
    fn ocr_on_unreadable_bytes_yields_empty_text() {
        let extractor = OcrFallbackExtractor::with_recognizer(Arc::new(BrokenRecognizer));
        assert_eq!(extractor.extract(b"not a pdf"), "");
    }

    #[test]
    fn ocr_on_oversized_image_yields_empty_text() {
        let recognizer = Arc::new(ScriptedRecognizer {
            fragments: vec!["never"],
            calls: AtomicUsize::new(0),
        });
        let extractor = OcrFallbackExtractor::with_recognizer(recognizer.clone());
        assert_eq!(extractor.extract(&fixtures::oversized_image_pdf()), "");
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn recognizer_is_built_once_across_threads() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let extractor = Arc::new(OcrFallbackExtractor::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let recognizer: Arc<dyn TextRecognizer> = Arc::new(ScriptedRecognizer {
                fragments: vec!["x"],
                calls: AtomicUsize::new(0),
            });
            Ok(recognizer)
        })));
        assert!(!extractor.is_initialized());

        let bytes = Arc::new(fixtures::scanned_pdf(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let extractor = Arc::clone(&extractor);
                let bytes = Arc::clone(&bytes);
                std::thread::spawn(move || extractor.extract(&bytes))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "x");
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(extractor.is_initialized());
    }

    #[test]
    fn failed_construction_is_not_retried() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let extractor = OcrFallbackExtractor::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PartscanError::OcrError("models missing".into()))
        }));

        let bytes = fixtures::scanned_pdf(1);
        assert_eq!(extractor.extract(&bytes), "");
        assert_eq!(extractor.extract(&bytes), "");
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
