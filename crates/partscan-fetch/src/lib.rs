// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// partscan-fetch — Downloading the documents a validation run refers to.

pub mod fetcher;

pub use fetcher::DocumentFetcher;
