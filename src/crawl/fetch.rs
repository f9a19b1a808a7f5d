// src/crawl/fetch.rs
// =============================================================================
// This module fetches pages for the crawl engine.
//
// The engine only needs four things back from a fetch: the status, the final
// address after redirects, the content type, and the body. The `Fetch` trait
// captures exactly that, so tests can swap in an in-memory site while the
// real CLI uses `HttpFetcher` (reqwest).
//
// There is no retry here. A transport failure is returned to the engine,
// which aborts the crawl.
// =============================================================================

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::checker;

// Errors raised while fetching a single address
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be built
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, DNS, timeout or body read failure
    #[error("request to {address} failed: {source}")]
    Request {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// Error status, only when the fetcher treats those as failures
    #[error("{address} returned HTTP {status}")]
    Status { address: String, status: u16 },

    /// Anything the in-memory fetchers in tests need to report
    #[error("{address}: {message}")]
    Other { address: String, message: String },
}

// What the crawl engine gets back for one address
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    /// The address actually served, after following redirects
    pub final_address: String,
    /// MIME essence, lowercased ("text/html"), without parameters
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Path component of the final address, percent-decoded like every
    /// canonical path
    pub fn final_path(&self) -> String {
        match Url::parse(&self.final_address) {
            Ok(url) => checker::decode_path(url.path()).into_owned(),
            Err(_) => self.final_address.clone(),
        }
    }

    /// True if the body is an HTML document worth scanning for links
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref() == Some("text/html")
    }
}

// Strips parameters from a Content-Type header value
//
// "text/html; charset=utf-8" -> "text/html"
pub fn mime_essence(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

// Anything that can fetch an address for the crawl engine
//
// The engine awaits one fetch at a time, so implementations don't need to
// be shareable across tasks.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, address: &str) -> Result<FetchedPage, FetchError>;
}

// Fetches pages over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    error_status_fails: bool,
}

impl HttpFetcher {
    // Creates a fetcher with a per-request timeout
    //
    // Parameters:
    //   timeout: how long a single request may take
    //   error_status_fails: if true, 4xx/5xx responses become FetchError::Status
    //     instead of being handed to the page hook
    pub fn new(timeout: Duration, error_status_fails: bool) -> Result<Self, FetchError> {
        // Redirects are followed; the engine compares the final address with
        // the requested path afterwards
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            error_status_fails,
        })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, address: &str) -> Result<FetchedPage, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            address: address.to_string(),
            source,
        };

        let response = self
            .client
            .get(address)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if self.error_status_fails && (status.is_client_error() || status.is_server_error()) {
            return Err(FetchError::Status {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        let final_address = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(mime_essence);

        // The body can only be read once, and it consumes the response
        let body = response.bytes().await.map_err(request_error)?.to_vec();

        Ok(FetchedPage {
            status: status.as_u16(),
            final_address,
            content_type,
            body,
        })
    }
}
