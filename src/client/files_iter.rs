//! Forward-only iteration over a paginated directory listing.

use std::sync::Arc;

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::client::client::Client;
use crate::client::error::{ClientError, Result};
use crate::client::get_files::{FilesPage, GetFilesCommand, RemoteEntry};

#[derive(Debug)]
enum IterState {
    HasResult,
    Exhausted,
    Errored(ClientError),
}

/// Yields the entries of a directory one at a time, fetching further pages
/// as the current one runs out.
///
/// The first failed page fetch is returned once as `Err`; after that the
/// iterator reports end of listing and keeps the error in [`err`](Self::err).
/// It never retries.
#[derive(Debug)]
pub struct FilesIterator {
    client: Arc<Client>,
    cancel: CancellationToken,
    command: GetFilesCommand,
    page: FilesPage,
    index: usize,
    state: IterState,
}

impl FilesIterator {
    /// Wrap an already fetched first page. `command` is the request that
    /// produced it.
    pub fn new(
        client: Arc<Client>,
        cancel: CancellationToken,
        command: GetFilesCommand,
        first_page: FilesPage,
    ) -> Self {
        Self {
            client,
            cancel,
            command,
            page: first_page,
            index: 0,
            state: IterState::HasResult,
        }
    }

    /// Fetch the first page of `command` and start iterating.
    pub async fn start(
        client: Arc<Client>,
        cancel: CancellationToken,
        command: GetFilesCommand,
    ) -> Result<Self> {
        let first_page = client.get_files(&cancel, &command).await?;
        Ok(Self::new(client, cancel, command, first_page))
    }

    /// The next entry, or `None` once the listing is done.
    pub async fn next(&mut self) -> Result<Option<RemoteEntry>> {
        loop {
            if !matches!(self.state, IterState::HasResult) {
                return Ok(None);
            }

            if let Some(entry) = self.page.entries.get(self.index) {
                self.index += 1;
                return Ok(Some(entry.clone()));
            }

            let Some(cursor) = self.page.page.next_cursor(self.command.cursor) else {
                self.state = IterState::Exhausted;
                return Ok(None);
            };
            // pages must move forward; a repeated or earlier start would cycle
            if cursor.start <= self.command.cursor.start {
                tracing::warn!(
                    path = %self.command.file_path,
                    start = self.command.cursor.start,
                    next = cursor.start,
                    "listing did not advance, stopping"
                );
                self.state = IterState::Exhausted;
                return Ok(None);
            }

            let command = self.command.with_cursor(cursor);
            tracing::debug!(
                path = %command.file_path,
                start = cursor.start,
                limit = cursor.limit,
                "fetching next page"
            );
            match self.client.get_files(&self.cancel, &command).await {
                Ok(page) => {
                    self.command = command;
                    self.page = page;
                    self.index = 0;
                }
                Err(e) => {
                    self.state = IterState::Errored(e.clone());
                    return Err(e);
                }
            }
        }
    }

    /// The error that stopped the iterator, if any.
    pub fn err(&self) -> Option<&ClientError> {
        match &self.state {
            IterState::Errored(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the listing has been read to its end without error.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, IterState::Exhausted)
    }

    /// Consume the iterator as a single-pass stream. A failed page fetch is
    /// yielded as the final item.
    pub fn into_stream(self) -> impl Stream<Item = Result<RemoteEntry>> {
        futures::stream::unfold(self, |mut iter| async move {
            match iter.next().await {
                Ok(Some(entry)) => Some((Ok(entry), iter)),
                Ok(None) => None,
                Err(e) => Some((Err(e), iter)),
            }
        })
    }
}
