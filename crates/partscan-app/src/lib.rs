// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// partscan-app — The validation pipeline and its file boundary.
//
// `orchestrator` drives fetch, extraction and matching for a set of requests;
// `input` and `report` translate between JSON row files and those requests;
// `runner` ties the three together for the `partscan` binary.

pub mod input;
pub mod orchestrator;
pub mod report;
pub mod runner;

pub use orchestrator::ValidationOrchestrator;
pub use runner::validate_file;
