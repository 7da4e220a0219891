// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open in-memory PDF documents and read their native text layer
// using the `lopdf` crate.

use std::collections::BTreeMap;

use lopdf::{Document, ObjectId};
use partscan_core::error::PartscanError;
use tracing::{debug, instrument};

/// Read-only view over a parsed PDF.
///
/// Wraps `lopdf::Document`; page numbers are 1-indexed as in lopdf.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Page number → page object, in page order.
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PartscanError> {
        let document = Document::load_mem(data).map_err(|err| {
            PartscanError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        let pages = document.get_pages();
        debug!(pages = pages.len(), "PDF loaded from bytes");

        Ok(Self { document, pages })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page numbers in page order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn page_id(&self, page_number: u32) -> Result<ObjectId, PartscanError> {
        self.pages.get(&page_number).copied().ok_or_else(|| {
            PartscanError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                self.pages.len()
            ))
        })
    }

    // -- Text layer -----------------------------------------------------------

    /// Native text of a single page (1-indexed).
    pub fn page_text(&self, page_number: u32) -> Result<String, PartscanError> {
        self.page_id(page_number)?;
        self.document.extract_text(&[page_number]).map_err(|err| {
            PartscanError::PdfError(format!(
                "failed to extract text from page {}: {}",
                page_number, err
            ))
        })
    }

    /// Native text of every page in page order, joined by newlines.
    ///
    /// A page whose text cannot be decoded contributes an empty string.
    #[instrument(skip(self), fields(pages = self.page_count()))]
    pub fn text_layer(&self) -> String {
        let texts: Vec<String> = self
            .page_numbers()
            .map(|page_number| match self.page_text(page_number) {
                Ok(text) => text,
                Err(err) => {
                    debug!(page_number, %err, "page text unreadable, treating as empty");
                    String::new()
                }
            })
            .collect();

        let joined = texts.join("\n");
        debug!(chars = joined.chars().count(), "text layer extracted");
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn garbage_bytes_are_a_pdf_error() {
        let result = PdfReader::from_bytes(b"definitely not a pdf");
        assert!(matches!(result, Err(PartscanError::PdfError(_))));
    }

    #[test]
    fn counts_pages() {
        let bytes = fixtures::text_pdf(&["one", "two", "three"]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 3);
        assert_eq!(reader.page_numbers().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn text_layer_keeps_page_order() {
        let bytes = fixtures::text_pdf(&["FIRSTPAGE", "SECONDPAGE"]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let text = reader.text_layer();
        let first = text.find("FIRSTPAGE").expect("first page text present");
        let second = text.find("SECONDPAGE").expect("second page text present");
        assert!(first < second);
        assert!(text[first..second].contains('\n'));
    }

    #[test]
    fn page_out_of_range() {
        let bytes = fixtures::text_pdf(&["only"]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert!(reader.page_text(2).is_err());
        assert!(reader.page_text(0).is_err());
    }
}
