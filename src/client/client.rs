use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::caches::{CacheConfig, ResponseCache};
use crate::client::command::{Command, RemoteRequest};
use crate::client::error::{ClientError, Result};
use crate::client::files_iter::FilesIterator;
use crate::client::get_commits::{CommitsPage, GetCommitsCommand};
use crate::client::get_file_content::GetFileContentCommand;
use crate::client::get_files::{FilesPage, GetFilesCommand};
use crate::client::get_tags::{GetTagsCommand, TagPage};
use crate::client::http_transport::HttpTransport;
use crate::client::open_raw_file::OpenRawFileCommand;
use crate::client::raw_stream::RawStream;
use crate::client::secret::SecretString;
use crate::client::transport::{BodyStream, Transport, TransportResponse};

/// Upper bound on the buffer reserved up front from a declared length.
const MAX_PREALLOCATE: u64 = 8 * 1024 * 1024;

/// Executes commands against one server with one credential.
///
/// The client owns its response cache, built eagerly at construction.
pub struct Client {
    base_url: String,
    access_key: SecretString,
    cache: ResponseCache,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client talking HTTP to `base_url`
    /// (e.g. `https://bitbucket.example.com/rest/api/latest`).
    pub fn new(
        base_url: impl Into<String>,
        access_key: SecretString,
        cache: &CacheConfig,
    ) -> Result<Self> {
        Self::with_transport(base_url, access_key, cache, Arc::new(HttpTransport::new()))
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport(
        base_url: impl Into<String>,
        access_key: SecretString,
        cache: &CacheConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            access_key,
            cache: ResponseCache::new(cache)?,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Run a command: validate, build, look up the cache, fetch, store, parse.
    ///
    /// Only complete bodies no larger than the cache threshold are stored.
    /// Failed or cancelled fetches leave the cache untouched.
    pub async fn execute<C: Command>(
        &self,
        cancel: &CancellationToken,
        command: &C,
    ) -> Result<C::Output> {
        command.validate()?;
        let url = command.build_url(&self.base_url)?;
        let kind = command.kind();

        // cache hits never reach `send`, so check here too
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled { url });
        }
        if let Some(body) = self.cache.get(&url) {
            tracing::debug!(command = %kind, url = %url, "cache hit");
            return command.parse_response(&body);
        }
        tracing::debug!(command = %kind, url = %url, "cache miss");

        let response = self.send(cancel, &url).await?;
        let max = self.cache.max_body_size();
        let oversized = response.content_length.is_some_and(|len| len > max);
        let body = collect(cancel, &url, response.content_length, response.body).await?;

        if oversized || !self.cache.set(url.clone(), body.clone()) {
            tracing::debug!(
                command = %kind,
                url = %url,
                size = body.len(),
                "body over cache threshold, not cached"
            );
        }

        command.parse_response(&body)
    }

    /// Open a request's body as a stream. Never reads or writes the cache.
    pub async fn open<R: RemoteRequest>(
        &self,
        cancel: &CancellationToken,
        request: &R,
    ) -> Result<RawStream> {
        request.validate()?;
        let url = request.build_url(&self.base_url)?;
        tracing::debug!(command = %request.kind(), url = %url, "opening stream");

        let response = self.send(cancel, &url).await?;
        Ok(RawStream::new(url, response.body, cancel.clone()))
    }

    /// Issue the request and require a 2xx status.
    async fn send(&self, cancel: &CancellationToken, url: &str) -> Result<TransportResponse> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ClientError::Cancelled { url: url.to_string() });
            }
            response = self.transport.get(url, &self.access_key) => response?,
        };

        if !response.status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: response.status.as_u16(),
                reason: response
                    .status
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        Ok(response)
    }

    // =========================================================================
    // Typed wrappers
    // =========================================================================

    pub async fn get_file_content(
        &self,
        cancel: &CancellationToken,
        command: &GetFileContentCommand,
    ) -> Result<Vec<u8>> {
        self.execute(cancel, command).await
    }

    pub async fn get_tags(
        &self,
        cancel: &CancellationToken,
        command: &GetTagsCommand,
    ) -> Result<TagPage> {
        self.execute(cancel, command).await
    }

    pub async fn get_files(
        &self,
        cancel: &CancellationToken,
        command: &GetFilesCommand,
    ) -> Result<FilesPage> {
        self.execute(cancel, command).await
    }

    pub async fn get_commits(
        &self,
        cancel: &CancellationToken,
        command: &GetCommitsCommand,
    ) -> Result<CommitsPage> {
        self.execute(cancel, command).await
    }

    pub async fn open_raw_file(
        &self,
        cancel: &CancellationToken,
        command: &OpenRawFileCommand,
    ) -> Result<RawStream> {
        self.open(cancel, command).await
    }

    /// Fetch the first page of a listing and wrap it in an iterator.
    pub async fn files_iterator(
        self: &Arc<Self>,
        cancel: &CancellationToken,
        command: GetFilesCommand,
    ) -> Result<FilesIterator> {
        FilesIterator::start(Arc::clone(self), cancel.clone(), command).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("access_key", &self.access_key)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Buffer a whole body, giving up as soon as `cancel` fires.
async fn collect(
    cancel: &CancellationToken,
    url: &str,
    content_length: Option<u64>,
    mut body: BodyStream,
) -> Result<Bytes> {
    let hint = content_length.unwrap_or(0).min(MAX_PREALLOCATE) as usize;
    let mut buf = BytesMut::with_capacity(hint);
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ClientError::Cancelled { url: url.to_string() });
            }
            next = body.next() => next,
        };
        match next {
            Some(chunk) => buf.extend_from_slice(&chunk?),
            None => return Ok(buf.freeze()),
        }
    }
}
