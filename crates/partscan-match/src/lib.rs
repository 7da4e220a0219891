// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// partscan-match — Deciding whether a part number appears in a document.
//
// Literal search first, then a character-level similarity scan over the
// document's whitespace tokens.

pub mod matcher;
pub mod sequence;

pub use matcher::{PartNumberMatcher, exact_match};
pub use sequence::{SequenceMatcher, ratio};
