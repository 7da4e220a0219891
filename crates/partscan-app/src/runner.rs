// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-to-file validation: load rows, run the pipeline, write the report.

use std::path::Path;
use std::time::Instant;

use partscan_core::ValidationOutcome;
use partscan_core::error::Result;
use tracing::info;

use crate::input::load_rows;
use crate::orchestrator::ValidationOrchestrator;
use crate::report::{build_records, log_summary, write_report};

/// Validate every row of `input` and write one result row each to `output`.
///
/// Fails only on boundary errors (unreadable or invalid input, unwritable
/// output); per-document failures show up as row statuses.
pub async fn validate_file(
    orchestrator: &ValidationOrchestrator,
    input: &Path,
    output: &Path,
) -> Result<Vec<ValidationOutcome>> {
    let started = Instant::now();
    let rows = load_rows(input)?;
    let requests: Vec<_> = rows.iter().map(|row| row.request.clone()).collect();

    let outcomes = orchestrator.run(&requests).await;

    let records = build_records(&rows, &outcomes, &orchestrator.config().similars_delimiter);
    write_report(output, &records)?;

    log_summary(&outcomes);
    info!(
        rows = outcomes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "validation finished"
    );
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::get;
    use image::DynamicImage;
    use partscan_core::error::PartscanError;
    use partscan_core::{StatusKind, ValidationConfig};
    use partscan_document::{TextRecognizer, fixtures};
    use serde_json::Value;
    use std::net::SocketAddr;
    use std::sync::Arc;

    struct SilentRecognizer;

    impl TextRecognizer for SilentRecognizer {
        fn recognize_fragments(&self, _page: &DynamicImage) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    async fn serve_datasheet() -> String {
        let body = fixtures::text_pdf(&[
            "Rev2 ABC-123 datasheet. Ordering information: ABC-123X (tape and reel), \
             ABC-123 (tube). All dimensions in millimetres.",
        ]);
        let app = Router::new().route(
            "/abc.pdf",
            get(move || {
                let body = body.clone();
                async move { body }
            }),
        );
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn orchestrator() -> ValidationOrchestrator {
        let config = ValidationConfig {
            fetch_timeout_secs: 5,
            ..Default::default()
        };
        ValidationOrchestrator::with_recognizer(config, Arc::new(SilentRecognizer)).unwrap()
    }

    #[tokio::test]
    async fn validates_file_end_to_end() {
        let base = serve_datasheet().await;
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rows.json");
        let output = dir.path().join("results.json");
        std::fs::write(
            &input,
            format!(
                r#"[
                    {{"Line": 1, "MPN": "abc-123", "PDF": "{base}/abc.pdf"}},
                    {{"Line": 2, "MPN": "ZZZ-000", "PDF": "{base}/abc.pdf"}},
                    {{"Line": 3, "MPN": "ABC-123", "PDF": "{base}/missing.pdf"}}
                ]"#
            ),
        )
        .unwrap();

        let outcomes = validate_file(&orchestrator(), &input, &output).await.unwrap();
        assert_eq!(outcomes.len(), 3);

        let written: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[0]["Line"], 1);
        assert_eq!(written[0]["STATUS"], StatusKind::Exact.label());
        assert_eq!(written[0]["EQUIVALENT"], "ABC-123");
        assert_eq!(written[0]["SIMILARS"], "ABC-123|ABC-123X");
        assert_eq!(written[1]["STATUS"], "Not Found");
        assert_eq!(written[2]["STATUS"], "May be Broken");
    }

    #[tokio::test]
    async fn invalid_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rows.json");
        let output = dir.path().join("results.json");
        std::fs::write(&input, r#"[{"MPN": "ABC-123"}]"#).unwrap();

        let err = validate_file(&orchestrator(), &input, &output)
            .await
            .unwrap_err();
        assert!(matches!(err, PartscanError::InvalidRow { row: 1, .. }));
        assert!(!output.exists());
    }
}
