// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP retrieval of document bytes.
//
// A batch is fetched concurrently, bounded by a semaphore. Every location is
// isolated: a timeout, refused connection, bad URL or non-2xx status drops
// that location from the result and never affects its siblings.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use partscan_core::error::{PartscanError, Result};
use partscan_core::{DocumentLocation, FetchConfig};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Shared HTTP client for one validation run. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl DocumentFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PartscanError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Fetch one document body. Only 2xx responses count as success.
    #[instrument(skip_all, fields(location = %location))]
    pub async fn fetch_one(&self, location: &DocumentLocation) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(location.as_str())
            .send()
            .await
            .map_err(|err| self.transport_error(location, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartscanError::HttpStatus {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(location, err))?;
        debug!(bytes = body.len(), "document fetched");
        Ok(body.to_vec())
    }

    /// Fetch every distinct location concurrently.
    ///
    /// Failed locations are absent from the returned map.
    #[instrument(skip_all, fields(requested = locations.len()))]
    pub async fn fetch_batch(
        &self,
        locations: &[DocumentLocation],
    ) -> HashMap<DocumentLocation, Vec<u8>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut seen = HashSet::new();
        let mut handles = Vec::new();

        for location in locations {
            if !seen.insert(location) {
                continue;
            }
            let fetcher = self.clone();
            let target = location.clone();
            let semaphore = Arc::clone(&semaphore);
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|err| {
                    PartscanError::Worker(format!("fetch semaphore closed: {err}"))
                })?;
                fetcher.fetch_one(&target).await
            });
            handles.push((location.clone(), handle));
        }

        let mut documents = HashMap::with_capacity(handles.len());
        for (location, handle) in handles {
            match handle.await {
                Ok(Ok(bytes)) => {
                    documents.insert(location, bytes);
                }
                Ok(Err(err)) => {
                    warn!(%location, error = %err, "document unavailable");
                }
                Err(err) => {
                    error!(%location, error = %err, "fetch task failed");
                }
            }
        }

        info!(fetched = documents.len(), distinct = seen.len(), "batch fetched");
        documents
    }

    fn transport_error(&self, location: &DocumentLocation, err: reqwest::Error) -> PartscanError {
        if err.is_timeout() {
            PartscanError::Timeout {
                stage: "fetch",
                secs: self.config.timeout.as_secs(),
            }
        } else {
            PartscanError::Fetch {
                location: location.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const BODY: &[u8] = b"%PDF-1.5 not really";

    /// Serve a few fixed routes on an ephemeral port; returns the base URL
    /// and the hit counter of `/counted.pdf`.
    async fn spawn_server() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new()
            .route("/doc.pdf", get(|| async { BODY.to_vec() }))
            .route("/missing.pdf", get(|| async { StatusCode::NOT_FOUND }))
            .route("/broken.pdf", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route(
                "/slow.pdf",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    BODY.to_vec()
                }),
            )
            .route(
                "/counted.pdf",
                get(move || {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        BODY.to_vec()
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    fn fetcher(timeout: Duration) -> DocumentFetcher {
        DocumentFetcher::new(&FetchConfig {
            timeout,
            max_concurrent: 4,
        })
        .unwrap()
    }

    fn loc(base: &str, path: &str) -> DocumentLocation {
        DocumentLocation::new(format!("{base}{path}"))
    }

    #[tokio::test]
    async fn fetches_successful_body() {
        let (base, _) = spawn_server().await;
        let bytes = fetcher(Duration::from_secs(5))
            .fetch_one(&loc(&base, "/doc.pdf"))
            .await
            .unwrap();
        assert_eq!(bytes, BODY);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, _) = spawn_server().await;
        let err = fetcher(Duration::from_secs(5))
            .fetch_one(&loc(&base, "/missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PartscanError::HttpStatus { status: 404, .. }), "got {err}");
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let (base, _) = spawn_server().await;
        let err = fetcher(Duration::from_millis(200))
            .fetch_one(&loc(&base, "/slow.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PartscanError::Timeout { stage: "fetch", .. }), "got {err}");
    }

    #[tokio::test]
    async fn malformed_location_is_a_fetch_error() {
        let err = fetcher(Duration::from_secs(1))
            .fetch_one(&DocumentLocation::new("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, PartscanError::Fetch { .. }), "got {err}");
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let (base, _) = spawn_server().await;
        let good = loc(&base, "/doc.pdf");
        let locations = vec![
            loc(&base, "/missing.pdf"),
            good.clone(),
            loc(&base, "/broken.pdf"),
            loc(&base, "/slow.pdf"),
            DocumentLocation::new("http://127.0.0.1:1/refused.pdf"),
        ];

        let documents = fetcher(Duration::from_millis(500)).fetch_batch(&locations).await;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents.get(&good).map(Vec::as_slice), Some(BODY));
    }

    #[tokio::test]
    async fn batch_fetches_duplicates_once() {
        let (base, hits) = spawn_server().await;
        let counted = loc(&base, "/counted.pdf");
        let locations = vec![counted.clone(), counted.clone(), counted.clone()];

        let documents = fetcher(Duration::from_secs(5)).fetch_batch(&locations).await;
        assert_eq!(documents.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let documents = fetcher(Duration::from_secs(1)).fetch_batch(&[]).await;
        assert!(documents.is_empty());
    }
}
