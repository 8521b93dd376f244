//! Typed client for the repository REST API.
//!
//! Each remote operation is a command value; [`Client::execute`] runs the
//! validate, build, cache, fetch, parse pipeline for any of them, and
//! [`Client::open`] streams a body without buffering or caching it.

#[allow(clippy::module_inception)]
mod client;
mod command;
mod error;
mod files_iter;
mod get_commits;
mod get_file_content;
mod get_files;
mod get_tags;
mod http_transport;
mod memory_transport;
mod open_raw_file;
mod raw_stream;
mod secret;
mod transport;

pub use client::Client;
pub use command::{Command, CommandKind, PageCursor, PageInfo, RemoteRequest};
pub use error::{ClientError, Result};
pub use files_iter::FilesIterator;
pub use get_commits::{Commit, CommitsPage, GetCommitsCommand, Person};
pub use get_file_content::GetFileContentCommand;
pub use get_files::{EntryKind, FilesPage, GetFilesCommand, RemoteEntry};
pub use get_tags::{GetTagsCommand, Tag, TagPage};
pub use http_transport::HttpTransport;
pub use memory_transport::{MemoryTransport, RecordedRequest};
pub use open_raw_file::OpenRawFileCommand;
pub use raw_stream::RawStream;
pub use secret::SecretString;
pub use transport::{BodyStream, Transport, TransportResponse};
