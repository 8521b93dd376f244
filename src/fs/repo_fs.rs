use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::{
    Client, ClientError, CommandKind, Commit, CommitsPage, GetCommitsCommand,
    GetFileContentCommand, GetFilesCommand, GetTagsCommand, PageCursor, RemoteEntry, Tag,
};
use crate::config::FsConfig;
use crate::fs::error::{FsError, Result};
use crate::fs::node::{FileInfo, Node};
use crate::fs::path;

/// Default number of entries requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// A read-only filesystem over one repository at one revision.
///
/// Paths given to every method are relative to the handle's root and must be
/// valid in the sense of [`path::valid_path`]. Clones share the client and
/// its response cache.
#[derive(Debug, Clone)]
pub struct RepoFs {
    client: Arc<Client>,
    project_key: String,
    repo_slug: String,
    at: String,
    root: String,
    page_size: u32,
    cancel: CancellationToken,
}

impl RepoFs {
    /// Build a filesystem and its HTTP client from configuration.
    pub fn new(config: &FsConfig) -> Result<Self> {
        let client = Client::new(
            config.base_url(),
            config.server.access_key.clone(),
            &config.cache,
        )
        .map_err(|e| FsError::client("new", config.repository.root.clone(), e))?;

        Ok(Self::with_client(
            Arc::new(client),
            config.repository.project_key.clone(),
            config.repository.slug.clone(),
        )
        .with_root(&config.repository.root)
        .with_at(config.repository.at.clone())
        .with_page_size(config.page_size))
    }

    /// A filesystem over an existing client, rooted at the repository root
    /// on the default branch.
    pub fn with_client(
        client: Arc<Client>,
        project_key: impl Into<String>,
        repo_slug: impl Into<String>,
    ) -> Self {
        Self {
            client,
            project_key: project_key.into(),
            repo_slug: repo_slug.into(),
            at: String::new(),
            root: ".".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.root = path::clean(root);
        self
    }

    pub fn with_at(mut self, at: impl Into<String>) -> Self {
        self.at = at.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Cancel every remote call made through this handle, and the nodes it
    /// opens, once `cancel` fires.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn repo_slug(&self) -> &str {
        &self.repo_slug
    }

    pub fn at(&self) -> &str {
        &self.at
    }

    /// The root prefix, `.` for the repository root.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn list_command(&self, dir: &str) -> GetFilesCommand {
        GetFilesCommand {
            project_key: self.project_key.clone(),
            repo_slug: self.repo_slug.clone(),
            file_path: path::remote(dir).to_string(),
            at: self.at.clone(),
            cursor: PageCursor::first(self.page_size),
        }
    }

    // =========================================================================
    // Filesystem operations
    // =========================================================================

    /// Open `name`.
    ///
    /// Resolution lists the parent directory and scans all of it, so the cost
    /// grows with the number of siblings. Should a listing repeat a name, the
    /// last occurrence wins. The root (`.`) is answered without a request.
    pub async fn open(&self, name: &str) -> Result<Node> {
        if !path::valid_path(name) {
            return Err(FsError::invalid("open", name));
        }

        let full = path::join(&self.root, name);
        if full == "." {
            return Ok(Node::root(self.clone()));
        }

        let (parent, base) = path::split(&full);
        let found = self.find(name, parent, base).await?;
        match found {
            Some(entry) => Ok(Node::new(self.clone(), full, FileInfo::from(&entry))),
            None => Err(FsError::NotFound {
                path: name.to_string(),
            }),
        }
    }

    async fn find(&self, name: &str, parent: &str, base: &str) -> Result<Option<RemoteEntry>> {
        // A file "parent" answers browse with its content, which is no listing.
        let not_found_or = |e: ClientError| {
            let not_a_listing = matches!(
                e,
                ClientError::Parse {
                    command: CommandKind::ListDirectoryEntries,
                    ..
                }
            );
            if e.is_not_found() || not_a_listing {
                FsError::NotFound {
                    path: name.to_string(),
                }
            } else {
                FsError::client("open", name, e)
            }
        };

        let mut iter = self
            .client
            .files_iterator(&self.cancel, self.list_command(parent))
            .await
            .map_err(not_found_or)?;

        let mut found = None;
        while let Some(entry) = iter.next().await.map_err(not_found_or)? {
            if entry.name == base {
                found = Some(entry);
            }
        }
        Ok(found)
    }

    /// Describe `name` without reading it.
    pub async fn stat(&self, name: &str) -> Result<FileInfo> {
        Ok(self.open(name).await?.info().clone())
    }

    /// All children of directory `name`, sorted by name.
    pub async fn read_dir(&self, name: &str) -> Result<Vec<Node>> {
        let mut dir = self.open(name).await?;
        let mut children = dir.read_dir(-1).await?.unwrap_or_default();
        children.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(children)
    }

    /// The whole content of file `name`, fetched through the response cache.
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        if !path::valid_path(name) {
            return Err(FsError::invalid("read", name));
        }
        let full = path::join(&self.root, name);
        if full == "." {
            return Err(FsError::invalid("read", name));
        }

        let command = GetFileContentCommand {
            project_key: self.project_key.clone(),
            repo_slug: self.repo_slug.clone(),
            file_path: full,
            at: self.at.clone(),
        };
        self.client
            .get_file_content(&self.cancel, &command)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    FsError::NotFound {
                        path: name.to_string(),
                    }
                } else {
                    FsError::client("read", name, e)
                }
            })
    }

    /// A filesystem rooted at directory `dir`, sharing this one's client.
    pub async fn sub(&self, dir: &str) -> Result<RepoFs> {
        let node = self.open(dir).await?;
        if !node.is_dir() {
            return Err(FsError::invalid("sub", dir));
        }
        Ok(Self {
            root: path::join(&self.root, dir),
            ..self.clone()
        })
    }

    // =========================================================================
    // Repository metadata
    // =========================================================================

    /// Every tag of the repository, following pagination to the end.
    pub async fn tags(&self, order_by: &str) -> Result<Vec<Tag>> {
        let mut command = GetTagsCommand {
            project_key: self.project_key.clone(),
            repo_slug: self.repo_slug.clone(),
            order_by: order_by.to_string(),
            cursor: PageCursor::first(self.page_size),
        };

        let mut tags = Vec::new();
        loop {
            let page = self
                .client
                .get_tags(&self.cancel, &command)
                .await
                .map_err(|e| FsError::client("tags", ".", e))?;
            tags.extend(page.tags);
            match page.page.next_cursor(command.cursor) {
                Some(next) if next != command.cursor => command = command.with_cursor(next),
                _ => return Ok(tags),
            }
        }
    }

    /// One page of commits.
    pub async fn commits(&self, order_by: &str, cursor: PageCursor) -> Result<CommitsPage> {
        let command = GetCommitsCommand {
            project_key: self.project_key.clone(),
            repo_slug: self.repo_slug.clone(),
            order_by: order_by.to_string(),
            cursor,
            commit_id: String::new(),
        };
        self.client
            .get_commits(&self.cancel, &command)
            .await
            .map_err(|e| FsError::client("commits", ".", e))
    }

    /// A single commit by id.
    pub async fn commit(&self, commit_id: &str) -> Result<Commit> {
        let command = GetCommitsCommand {
            project_key: self.project_key.clone(),
            repo_slug: self.repo_slug.clone(),
            commit_id: commit_id.to_string(),
            ..GetCommitsCommand::default()
        };
        let page = self
            .client
            .get_commits(&self.cancel, &command)
            .await
            .map_err(|e| FsError::client("commits", commit_id, e))?;
        page.commits.into_iter().next().ok_or_else(|| FsError::NotFound {
            path: commit_id.to_string(),
        })
    }
}
