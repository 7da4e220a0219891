// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognizer seam between page bitmaps and whichever OCR engine is in use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use partscan_core::error::Result;

/// Turns one page bitmap into the text fragments detected on it, in reading
/// order.
pub trait TextRecognizer: Send + Sync {
    fn recognize_fragments(&self, page: &DynamicImage) -> Result<Vec<String>>;
}

/// Builds the shared recognizer on first use. Called at most once per
/// [`OcrFallbackExtractor`](crate::OcrFallbackExtractor).
pub type RecognizerFactory = Box<dyn Fn() -> Result<Arc<dyn TextRecognizer>> + Send + Sync>;

/// Factory for the `ocrs` engine, loading models from `model_dir` or the
/// default cache directory.
///
/// Without the `ocr` feature the factory always fails, so every OCR attempt
/// yields empty text.
pub fn ocrs_factory(model_dir: Option<PathBuf>) -> RecognizerFactory {
    Box::new(move || load_engine(model_dir.as_deref()))
}

#[cfg(feature = "ocr")]
fn load_engine(model_dir: Option<&Path>) -> Result<Arc<dyn TextRecognizer>> {
    use crate::scan::ocr::{ModelPaths, OcrEngine};

    let paths = model_dir.map_or_else(ModelPaths::default, ModelPaths::in_dir);
    let engine: Arc<dyn TextRecognizer> = Arc::new(OcrEngine::new(&paths)?);
    Ok(engine)
}

#[cfg(not(feature = "ocr"))]
fn load_engine(_model_dir: Option<&Path>) -> Result<Arc<dyn TextRecognizer>> {
    Err(partscan_core::PartscanError::OcrError(
        "partscan-document was built without the `ocr` feature".into(),
    ))
}

#[cfg(all(test, not(feature = "ocr")))]
mod tests {
    use super::*;

    #[test]
    fn factory_fails_without_ocr_feature() {
        let factory = ocrs_factory(None);
        assert!(factory().is_err());
    }
}
