//! HTTP boundary for the sync clients.
//!
//! Both API clients in this workspace talk to the network exclusively
//! through the [`HttpTransport`] trait. Production wires in
//! [`ReqwestTransport`]; tests enable the `mock` feature and wire in
//! [`MockTransport`], which replays canned responses and records every
//! request it sees. Keeping the boundary this narrow means client logic
//! (auth, retry, rate limiting) is testable without a live endpoint.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// HTTP methods the sync clients use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header list preserving insertion order and duplicates.
pub type HttpHeaders = Vec<(String, String)>;

/// First header value matching `name`, case-insensitively.
#[must_use]
pub fn header_get(headers: &HttpHeaders, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

/// A request as the sync clients describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    /// Whole-request deadline; `None` leaves the transport default.
    pub timeout: Option<Duration>,
}

/// A response as the sync clients consume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

/// Transport-level failures: connection, TLS, timeout.
///
/// HTTP error statuses are not transport failures; they come back as
/// ordinary [`HttpResponse`]s for the clients to interpret.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for {method} {url}")]
    NoMockResponse { method: HttpMethod, url: String },
}

/// The seam the API clients call through.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Production transport backed by a shared [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        ReqwestTransport::new(reqwest::Client::new())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client.request(method, &request.url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockInner {
        routes: HashMap<(HttpMethod, String), VecDeque<HttpResponse>>,
        requests: Vec<HttpRequest>,
    }

    /// Scripted in-memory transport.
    ///
    /// Responses are registered per `(method, url)` and consumed in FIFO
    /// order, so one URL can answer differently across attempts (a 429
    /// followed by a 200, say). Every request sent is recorded and
    /// retrievable via [`MockTransport::requests`]. Clones share state.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<MockInner>>,
    }

    impl MockTransport {
        #[must_use]
        pub fn new() -> Self {
            MockTransport::default()
        }

        /// Queue a response for `method` + `url`.
        pub fn push_response(&self, method: HttpMethod, url: &str, response: HttpResponse) {
            let mut inner = self.inner.lock().expect("mock transport lock poisoned");
            inner
                .routes
                .entry((method, url.to_string()))
                .or_default()
                .push_back(response);
        }

        /// Every request sent through this transport, in order.
        #[must_use]
        pub fn requests(&self) -> Vec<HttpRequest> {
            let inner = self.inner.lock().expect("mock transport lock poisoned");
            inner.requests.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let mut inner = self.inner.lock().expect("mock transport lock poisoned");
            let key = (request.method, request.url.clone());
            inner.requests.push(request);
            inner
                .routes
                .get_mut(&key)
                .and_then(VecDeque::pop_front)
                .ok_or(HttpError::NoMockResponse {
                    method: key.0,
                    url: key.1,
                })
        }
    }
}
