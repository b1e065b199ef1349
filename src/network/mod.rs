//! Fetch boundary for document prefetching
//!
//! The queue layer talks to the network through the [`DocumentFetcher`]
//! trait so tests can script responses; [`HttpFetcher`] is the real
//! reqwest-backed implementation.

mod response;

pub use response::FetchedDocument;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::utils::error::{NavError, Result};

/// Errors produced by the fetch boundary
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, read)
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    /// The URL was rejected before a request was made
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Issues GET-style requests for full HTML documents.
///
/// The cancellation token is supplied by the fetch queue; implementations
/// observe it at their suspension points and settle with
/// [`NavError::Cancelled`] when it fires. A non-success HTTP status is not
/// an error at this layer; it is reported through
/// [`FetchedDocument::is_success`].
#[cfg_attr(test, mockall::automock)]
pub trait DocumentFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<FetchedDocument>>;
}

/// HTTP fetcher backed by a pooled reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<FetchedDocument>> {
        let client = self.client.clone();
        let url = url.to_string();
        let cancel = cancel.clone();

        Box::pin(async move {
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(NavError::Cancelled),
                sent = client.get(&url).send() => sent.map_err(|e| FetchError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                })?,
            };
            let status = response.status().as_u16();
            let body = tokio::select! {
                _ = cancel.cancelled() => return Err(NavError::Cancelled),
                read = response.text() => read.map_err(|e| FetchError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                })?,
            };
            Ok(FetchedDocument::new(status, body))
        })
    }
}
