//! HTTP exchange seam used by `ChatClient`.
//!
//! `Transport` is the only place the client touches the network, so tests
//! can swap in an in-memory implementation and feed arbitrary byte chunks.
mod http;

use std::pin::Pin;
use std::time::Duration;

use futures::StreamExt as _;
use serde::de::DeserializeOwned;

use crate::errors::{ChatError, TransportError};

pub use http::ReqwestTransport;

/// Incremental response body. Each item is one read from the network.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, TransportError>> + Send + 'static>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outgoing HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Whole-exchange timeout. `None` leaves the read unbounded, which is what
    /// streaming requests use.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response to an `HttpRequest`.
///
/// `body` is `None` when the transport could not expose a readable stream.
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<ByteStream>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Option<ByteStream>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reads the whole body into memory. A missing body reads as empty.
    pub async fn bytes(self) -> Result<Vec<u8>, TransportError> {
        let Some(mut body) = self.body else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// Reads the whole body and parses it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ChatError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ChatError::protocol(format!("invalid JSON response body: {e}")))
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// One HTTP request/response exchange.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns as soon as the status line is known.
    ///
    /// The body is read lazily through `HttpResponse::body`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Posts `body` and returns the response with its body left streaming.
    async fn post_stream(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::post(url).headers(headers).body(body))
            .await
    }
}
