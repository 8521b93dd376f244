use bytes::{Buf, Bytes};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::client::error::{ClientError, Result};
use crate::client::transport::BodyStream;

/// An open, uncached response body.
///
/// Reads pull chunks from the transport on demand and hand them out through a
/// caller-provided buffer, keeping whatever does not fit for the next read.
pub struct RawStream {
    url: String,
    body: Option<BodyStream>,
    pending: Bytes,
    cancel: CancellationToken,
}

impl RawStream {
    pub(crate) fn new(url: String, body: BodyStream, cancel: CancellationToken) -> Self {
        Self {
            url,
            body: Some(body),
            pending: Bytes::new(),
            cancel,
        }
    }

    /// The URL this stream was opened from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read up to `buf.len()` bytes. Returns 0 at end of stream, after
    /// [`close`](Self::close), or when `buf` is empty.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pending.is_empty() {
            let Some(body) = self.body.as_mut() else {
                return Ok(0);
            };
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(ClientError::Cancelled { url: self.url.clone() });
                }
                next = body.next() => next,
            };
            match next {
                Some(Ok(chunk)) => self.pending = chunk,
                Some(Err(e)) => return Err(e),
                None => {
                    self.body = None;
                    return Ok(0);
                }
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }

    /// Read everything that is left.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = self.pending.to_vec();
        self.pending.clear();

        while let Some(body) = self.body.as_mut() {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(ClientError::Cancelled { url: self.url.clone() });
                }
                next = body.next() => next,
            };
            match next {
                Some(Ok(chunk)) => out.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(e),
                None => self.body = None,
            }
        }
        Ok(out)
    }

    /// Release the underlying body. Returns true only for the call that
    /// actually released it.
    pub fn close(&mut self) -> bool {
        self.pending.clear();
        self.body.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.body.is_none() && self.pending.is_empty()
    }
}

impl std::fmt::Debug for RawStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawStream")
            .field("url", &self.url)
            .field("open", &self.body.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}
