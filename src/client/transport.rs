use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::StatusCode;

use crate::client::error::Result;
use crate::client::secret::SecretString;

/// Body chunks as they arrive from the server.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// The response head plus a streaming body.
pub struct TransportResponse {
    pub status: StatusCode,
    /// Declared `Content-Length`, when the server sent one.
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues authenticated GET requests.
///
/// Implementations attach `Authorization: Bearer {secret}` to every request.
/// Non-2xx statuses are returned as responses, not errors; the client decides
/// what to do with them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, credential: &SecretString) -> Result<TransportResponse>;
}
