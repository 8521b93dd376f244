use serde::Serialize;

use crate::client::{FilesIterator, OpenRawFileCommand, RawStream, RemoteEntry};
use crate::fs::error::{FsError, Result};
use crate::fs::path;
use crate::fs::repo_fs::RepoFs;

/// What `stat` reports about a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Final path element; `.` for the root.
    pub name: String,
    /// Size in bytes; always 0 for directories.
    pub size: u64,
    pub is_dir: bool,
}

impl From<&RemoteEntry> for FileInfo {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            is_dir: entry.is_dir(),
        }
    }
}

/// An opened file or directory.
///
/// Nodes are cheap views: opening the same path twice yields two independent
/// nodes. File content is fetched on the first `read`, directory children on
/// the first `read_dir`. A node is meant for one caller at a time.
#[derive(Debug)]
pub struct Node {
    fs: RepoFs,
    path: String,
    info: FileInfo,
    data: Option<RawStream>,
    dir_iter: Option<FilesIterator>,
    dir_err: Option<FsError>,
}

impl Node {
    pub(crate) fn new(fs: RepoFs, path: String, info: FileInfo) -> Self {
        Self {
            fs,
            path,
            info,
            data: None,
            dir_iter: None,
            dir_err: None,
        }
    }

    pub(crate) fn root(fs: RepoFs) -> Self {
        Self::new(
            fs,
            ".".to_string(),
            FileInfo {
                name: ".".to_string(),
                size: 0,
                is_dir: true,
            },
        )
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Location within the repository, root prefix included.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.info.is_dir
    }

    // =========================================================================
    // File content
    // =========================================================================

    /// Read the next chunk of file content into `buf`. Returns 0 at the end.
    ///
    /// The first call opens an uncached raw stream; later calls continue it.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let path = self.path.clone();
        let stream = self.stream("read").await?;
        stream
            .read(buf)
            .await
            .map_err(|e| FsError::client("read", path, e))
    }

    /// Read whatever content is left.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let path = self.path.clone();
        let stream = self.stream("read").await?;
        stream
            .read_to_end()
            .await
            .map_err(|e| FsError::client("read", path, e))
    }

    /// Release the content stream, if one was opened. Returns true only when
    /// a stream was actually released.
    pub fn close(&mut self) -> bool {
        match self.data.take() {
            Some(mut stream) => stream.close(),
            None => false,
        }
    }

    async fn stream(&mut self, op: &'static str) -> Result<&mut RawStream> {
        if self.info.is_dir {
            return Err(FsError::invalid(op, self.path.clone()));
        }
        let stream = match self.data.take() {
            Some(stream) => stream,
            None => {
                let command = OpenRawFileCommand {
                    project_key: self.fs.project_key().to_string(),
                    repo_slug: self.fs.repo_slug().to_string(),
                    file_path: self.path.clone(),
                    at: self.fs.at().to_string(),
                };
                self.fs
                    .client()
                    .open_raw_file(self.fs.cancel_token(), &command)
                    .await
                    .map_err(|e| FsError::client(op, self.path.clone(), e))?
            }
        };
        Ok(self.data.insert(stream))
    }

    // =========================================================================
    // Directory listing
    // =========================================================================

    /// Read up to `n` children, continuing where the previous call stopped.
    ///
    /// With `n > 0` the result is `None` once the listing is exhausted. With
    /// `n <= 0` every remaining child is returned at once, possibly an empty
    /// list. A failed page fetch is returned again on every later call.
    pub async fn read_dir(&mut self, n: isize) -> Result<Option<Vec<Node>>> {
        if !self.info.is_dir {
            return Err(FsError::invalid("readdir", self.path.clone()));
        }
        if let Some(err) = &self.dir_err {
            return Err(err.clone());
        }

        if self.dir_iter.is_none() {
            let command = self.fs.list_command(&self.path);
            let started = self
                .fs
                .client()
                .files_iterator(self.fs.cancel_token(), command)
                .await;
            match started {
                Ok(iter) => self.dir_iter = Some(iter),
                Err(e) => return Err(self.fail(e)),
            }
        }

        let mut children = Vec::new();
        while n <= 0 || children.len() < n.unsigned_abs() {
            let next = match self.dir_iter.as_mut() {
                Some(iter) => iter.next().await,
                None => break,
            };
            match next {
                Ok(Some(entry)) => {
                    let child_path = path::join(&self.path, &entry.name);
                    children.push(Node::new(
                        self.fs.clone(),
                        child_path,
                        FileInfo::from(&entry),
                    ));
                }
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            }
        }

        if n > 0 && children.is_empty() {
            return Ok(None);
        }
        Ok(Some(children))
    }

    fn fail(&mut self, source: crate::client::ClientError) -> FsError {
        let err = FsError::client("readdir", self.path.clone(), source);
        self.dir_err = Some(err.clone());
        err
    }
}
