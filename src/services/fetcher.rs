// src/services/fetcher.rs

//! Page fetcher with bounded retry.
//!
//! One call fetches one page: transient failures (timeouts, dropped
//! connections, HTTP 429 and 5xx) are retried with doubling backoff, anything
//! else is reported at once. The pause between different pages is the run
//! loop's job, not the fetcher's.

use std::error::Error as _;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{FetchError, Result};
use crate::models::MonitorConfig;
use crate::services::extractor::{HtmlTextExtractor, TextExtractor};

/// Source of normalized page text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// HTTP implementation backed by reqwest.
pub struct HttpFetcher {
    client: Client,
    extractor: Box<dyn TextExtractor>,
    monitor: MonitorConfig,
}

impl HttpFetcher {
    /// Create a fetcher using the HTML text extractor.
    pub fn new(monitor: &MonitorConfig) -> Result<Self> {
        Self::with_extractor(monitor, HtmlTextExtractor::new())
    }

    /// Create a fetcher with a custom text extractor.
    pub fn with_extractor(
        monitor: &MonitorConfig,
        extractor: impl TextExtractor + 'static,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&monitor.user_agent)
            .timeout(monitor.timeout())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            extractor: Box::new(extractor),
            monitor: monitor.clone(),
        })
    }

    /// One request, no retry.
    async fn attempt(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| classify_error(&e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        let mut retries = 0;
        loop {
            match self.attempt(url).await {
                Ok(body) => {
                    return self.extractor.extract(&body).map_err(|e| {
                        log::warn!("Failed to extract text from {}: {}", url, e);
                        FetchError::from(e)
                    });
                }
                Err(err) if err.is_transient() && retries < self.monitor.retry_count => {
                    retries += 1;
                    let wait = self.monitor.backoff(retries);
                    log::debug!(
                        "Retry {}/{} for {} in {:?}: {}",
                        retries,
                        self.monitor.retry_count,
                        url,
                        wait,
                        err
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(err) => {
                    log::warn!("Failed to fetch {}: {}", url, err);
                    return Err(err);
                }
            }
        }
    }
}

/// Map a reqwest failure onto the closed fetch error set.
fn classify_error(err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    if let Some(status) = err.status() {
        return FetchError::HttpStatus(status.as_u16());
    }

    let reason = error_chain(err);
    if err.is_builder() {
        return FetchError::ConnectionFailed {
            reason,
            transient: false,
        };
    }

    let lowered = reason.to_lowercase();
    let permanent = ["dns error", "failed to lookup", "certificate", "tls", "ssl"]
        .iter()
        .any(|needle| lowered.contains(needle));

    FetchError::ConnectionFailed {
        reason,
        transient: !permanent,
    }
}

/// Underlying causes only; the top-level message embeds the URL.
fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    if parts.is_empty() {
        return err.to_string();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve the given raw responses, one per connection, in order.
    async fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            for raw in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(raw.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/page", addr), hits)
    }

    fn quick_config(retry_count: u32) -> MonitorConfig {
        MonitorConfig {
            retry_count,
            backoff_base_ms: 1,
            timeout_secs: 1,
            ..MonitorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_success_extracts_text() {
        let (url, hits) = serve(vec![response(
            "200 OK",
            "<html><body><main><p>Program X is funded.</p></main></body></html>",
        )])
        .await;
        let fetcher = HttpFetcher::new(&quick_config(2)).unwrap();

        assert_eq!(fetcher.fetch(&url).await.unwrap(), "Program X is funded.");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_status_is_retried() {
        let (url, hits) = serve(vec![
            response("503 Service Unavailable", ""),
            response("429 Too Many Requests", ""),
            response("200 OK", "<p>back</p>"),
        ])
        .await;
        let fetcher = HttpFetcher::new(&quick_config(2)).unwrap();

        assert_eq!(fetcher.fetch(&url).await.unwrap(), "back");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let (url, hits) = serve(vec![
            response("500 Internal Server Error", ""),
            response("500 Internal Server Error", ""),
            response("500 Internal Server Error", ""),
            response("200 OK", "<p>too late</p>"),
        ])
        .await;
        let fetcher = HttpFetcher::new(&quick_config(2)).unwrap();

        assert_eq!(fetcher.fetch(&url).await, Err(FetchError::HttpStatus(500)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, hits) = serve(vec![
            response("404 Not Found", ""),
            response("200 OK", "<p>never</p>"),
        ])
        .await;
        let fetcher = HttpFetcher::new(&quick_config(2)).unwrap();

        assert_eq!(fetcher.fetch(&url).await, Err(FetchError::HttpStatus(404)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_page_is_extraction_error() {
        let (url, _) = serve(vec![response("200 OK", "<html><body></body></html>")]).await;
        let fetcher = HttpFetcher::new(&quick_config(0)).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err.kind(), "extraction");
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let fetcher = HttpFetcher::new(&quick_config(0)).unwrap();

        let err = fetcher.fetch(&format!("http://{}/", addr)).await.unwrap_err();
        assert!(matches!(err, FetchError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_dropped_connection_is_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            // First connection is closed without a response.
            if let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(socket);
            }
            if let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let raw = response("200 OK", "<p>recovered</p>");
                let _ = socket.write_all(raw.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        let fetcher = HttpFetcher::new(&quick_config(2)).unwrap();

        let text = fetcher.fetch(&format!("http://{}/page", addr)).await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_not_retried() {
        // A retry would sleep for the full backoff and trip the outer timeout.
        let config = MonitorConfig {
            retry_count: 3,
            backoff_base_ms: 10_000,
            timeout_secs: 5,
            ..MonitorConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();

        let err = tokio::time::timeout(
            std::time::Duration::from_secs(8),
            fetcher.fetch("http://url-monitor-test.invalid/"),
        )
        .await
        .expect("permanent failure must not wait for a retry")
        .unwrap_err();

        assert!(matches!(
            err,
            FetchError::ConnectionFailed {
                transient: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_is_permanent() {
        let fetcher = HttpFetcher::new(&quick_config(3)).unwrap();

        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::ConnectionFailed {
                transient: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let fetcher = HttpFetcher::new(&quick_config(0)).unwrap();

        let err = fetcher.fetch(&format!("http://{}/", addr)).await.unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }
}
