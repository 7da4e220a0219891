// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs` recognizer for scanned datasheet pages.
//
// Needs the `ocr` feature and two `rten` models on disk: a word detector
// (`text-detection.rten`) and a line recognizer (`text-recognition.rten`).
// `ocrs-cli` downloads both into its cache directory the first time it runs,
// which is where `ModelPaths::default()` looks:
//
// ```sh
// cargo install ocrs-cli && ocrs any-image.png
// ```

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use partscan_core::error::{PartscanError, Result};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::scan::recognizer::TextRecognizer;

const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// The `ocrs-cli` model cache: `$XDG_CACHE_HOME/ocrs`, else `~/.cache/ocrs`.
fn ocrs_cache_dir() -> PathBuf {
    match (std::env::var_os("XDG_CACHE_HOME"), std::env::var_os("HOME")) {
        (Some(cache), _) => PathBuf::from(cache).join("ocrs"),
        (None, Some(home)) => PathBuf::from(home).join(".cache/ocrs"),
        (None, None) => PathBuf::from("ocrs"),
    }
}

/// Locations of the detection and recognition models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::in_dir(ocrs_cache_dir())
    }
}

impl ModelPaths {
    /// Both models under `dir`, with their standard file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL),
            recognition: dir.join(RECOGNITION_MODEL),
        }
    }

    /// Fail early, with a hint, when either model file is missing.
    pub fn check(&self) -> Result<()> {
        match [&self.detection, &self.recognition].into_iter().find(|p| !p.is_file()) {
            Some(missing) => Err(PartscanError::OcrError(format!(
                "no OCR model at {} (running `ocrs-cli` once downloads the models)",
                missing.display()
            ))),
            None => Ok(()),
        }
    }
}

fn load_model(role: &str, path: &Path) -> Result<Model> {
    info!(role, path = %path.display(), "loading OCR model");
    Model::load_file(path).map_err(|err| {
        PartscanError::OcrError(format!("{role} model {} unusable: {err}", path.display()))
    })
}

fn ocr_error(step: &str, err: impl std::fmt::Display) -> PartscanError {
    PartscanError::OcrError(format!("{step}: {err}"))
}

/// Word detection plus line recognition over page bitmaps.
///
/// Model loading dominates the cost, so one engine serves a whole run. The
/// workspace builds `ocrs` and `rten` optimised even in dev profiles.
pub struct OcrEngine {
    inner: OcrsEngine,
}

impl OcrEngine {
    #[instrument(skip_all)]
    pub fn new(paths: &ModelPaths) -> Result<Self> {
        paths.check()?;
        let params = OcrEngineParams {
            detection_model: Some(load_model("detection", &paths.detection)?),
            recognition_model: Some(load_model("recognition", &paths.recognition)?),
            ..Default::default()
        };
        let inner = OcrsEngine::new(params)
            .map_err(|err| PartscanError::OcrError(format!("engine setup failed: {err}")))?;
        info!("OCR engine ready");
        Ok(Self { inner })
    }

    /// Recognised text lines of one page, top to bottom, blank lines dropped.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn read_lines(&self, page: &DynamicImage) -> Result<Vec<String>> {
        let pixels = page.to_rgb8();
        let source = ImageSource::from_bytes(pixels.as_raw(), pixels.dimensions())
            .map_err(|err| ocr_error("page bitmap rejected", err))?;
        let input = self
            .inner
            .prepare_input(source)
            .map_err(|err| ocr_error("preprocessing", err))?;

        let words = self
            .inner
            .detect_words(&input)
            .map_err(|err| ocr_error("word detection", err))?;
        let lines = self.inner.find_text_lines(&input, &words);
        let texts = self
            .inner
            .recognize_text(&input, &lines)
            .map_err(|err| ocr_error("line recognition", err))?;

        let lines: Vec<String> = texts
            .into_iter()
            .flatten()
            .map(|line| line.to_string())
            .filter(|line| !line.trim().is_empty())
            .collect();
        debug!(words = words.len(), lines = lines.len(), "page read");
        Ok(lines)
    }
}

impl TextRecognizer for OcrEngine {
    fn recognize_fragments(&self, page: &DynamicImage) -> Result<Vec<String>> {
        self.read_lines(page)
    }
}
