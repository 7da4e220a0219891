// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// partscan-document — Turning PDF bytes into text.
//
// Provides the native text-layer reader, page rasterization of scanned pages,
// the OCR recognizer seam (with the `ocrs` engine behind the `ocr` feature),
// and the two extractors the validation pipeline drives.

pub mod extract;
pub mod pdf;
pub mod scan;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

// Re-export the primary structs so callers can use `partscan_document::PdfReader` etc.
pub use extract::{OcrFallbackExtractor, TextExtractor, needs_ocr};
pub use pdf::reader::PdfReader;
pub use scan::recognizer::{RecognizerFactory, TextRecognizer, ocrs_factory};

#[cfg(feature = "ocr")]
pub use scan::ocr::{ModelPaths, OcrEngine};
