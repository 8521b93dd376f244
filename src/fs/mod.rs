//! The repository presented as a read-only filesystem.
//!
//! [`RepoFs`] resolves slash-separated paths against paginated directory
//! listings; [`Node`] is an opened file or directory that streams its content
//! or its children on demand.

mod error;
mod node;
pub mod path;
mod repo_fs;

pub use error::{FsError, Result};
pub use node::{FileInfo, Node};
pub use repo_fs::{RepoFs, DEFAULT_PAGE_SIZE};
