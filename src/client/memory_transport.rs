use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::client::error::{ClientError, Result};
use crate::client::secret::SecretString;
use crate::client::transport::{Transport, TransportResponse};

#[derive(Debug, Clone)]
enum Route {
    Respond {
        status: StatusCode,
        body: Bytes,
        chunk_size: Option<usize>,
    },
    Fail(String),
    Hang,
}

/// A request seen by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    /// The bearer secret in cleartext.
    pub credential: String,
}

/// An in-memory [`Transport`] serving canned responses keyed by exact URL,
/// intended primarily for testing.
///
/// Unknown URLs answer `404 Not Found` with an empty body. Every request is
/// recorded, including ones that hit no route.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `200 OK` and `body`.
    pub fn respond(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.respond_with_status(url, StatusCode::OK, body);
    }

    pub fn respond_with_status(
        &self,
        url: impl Into<String>,
        status: StatusCode,
        body: impl Into<Bytes>,
    ) {
        self.insert(
            url,
            Route::Respond {
                status,
                body: body.into(),
                chunk_size: None,
            },
        );
    }

    /// Answer `url` with `200 OK`, delivering the body in `chunk_size` pieces
    /// and without a declared length.
    pub fn respond_chunked(
        &self,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        chunk_size: usize,
    ) {
        self.insert(
            url,
            Route::Respond {
                status: StatusCode::OK,
                body: body.into(),
                chunk_size: Some(chunk_size.max(1)),
            },
        );
    }

    /// Fail requests to `url` with a transport error.
    pub fn fail(&self, url: impl Into<String>, message: impl Into<String>) {
        self.insert(url, Route::Fail(message.into()));
    }

    /// Never answer requests to `url`.
    pub fn hang(&self, url: impl Into<String>) {
        self.insert(url, Route::Hang);
    }

    /// Drop every route.
    pub fn clear_routes(&self) {
        self.routes.lock().clear();
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests made to exactly `url`.
    pub fn count_for(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.url == url).count()
    }

    fn insert(&self, url: impl Into<String>, route: Route) {
        self.routes.lock().insert(url.into(), route);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &str, credential: &SecretString) -> Result<TransportResponse> {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            credential: credential.expose().to_string(),
        });

        let route = self.routes.lock().get(url).cloned();
        match route {
            None => Ok(TransportResponse {
                status: StatusCode::NOT_FOUND,
                content_length: Some(0),
                body: Box::pin(futures::stream::empty()),
            }),
            Some(Route::Respond {
                status,
                body,
                chunk_size,
            }) => {
                let (content_length, chunks) = match chunk_size {
                    None => (Some(body.len() as u64), vec![body]),
                    Some(size) => {
                        let chunks = (0..body.len())
                            .step_by(size)
                            .map(|i| body.slice(i..(i + size).min(body.len())))
                            .collect();
                        (None, chunks)
                    }
                };
                Ok(TransportResponse {
                    status,
                    content_length,
                    body: Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))),
                })
            }
            Some(Route::Fail(message)) => Err(ClientError::Transport {
                url: url.to_string(),
                message,
            }),
            Some(Route::Hang) => futures::future::pending().await,
        }
    }
}
