use std::fmt;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use url::Url;

/// Body and content type of a fetched resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedContent {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Why a fetch did not produce content. Non-2xx statuses count as
/// failures.
#[derive(Debug)]
pub enum FetchError {
    Request(reqwest::Error),
    Status(StatusCode),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(source) => write!(f, "fetch failed: {source}"),
            Self::Status(status) => write!(f, "fetch returned {status}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(source) => Some(source),
            Self::Status(_) => None,
        }
    }
}

/// Blocking GET used by prompt normalization. The call blocks the caller
/// until the transport completes or times out.
pub trait RemoteFetch {
    fn get(&self, url: &Url) -> Result<FetchedContent, FetchError>;
}

/// Production fetcher over a blocking reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RemoteFetch for HttpFetcher {
    fn get(&self, url: &Url) -> Result<FetchedContent, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(FetchError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response.bytes().map_err(FetchError::Request)?.to_vec();
        Ok(FetchedContent { content_type, body })
    }
}

/// Strips parameters and lowercases a Content-Type header value.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
