// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optical character recognition for scanned pages.

pub mod recognizer;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use recognizer::{RecognizerFactory, TextRecognizer, ocrs_factory};

#[cfg(feature = "ocr")]
pub use ocr::{ModelPaths, OcrEngine};
