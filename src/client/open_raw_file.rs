use crate::client::command::{require, CommandKind, RemoteRequest, RepoUrl};
use crate::client::error::Result;

/// Open a file's raw bytes as a stream.
///
/// There is no parse step: the body is handed to the caller as it arrives and
/// never enters the response cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenRawFileCommand {
    pub project_key: String,
    pub repo_slug: String,
    pub file_path: String,
    pub at: String,
}

impl RemoteRequest for OpenRawFileCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::OpenRawFile
    }

    fn validate(&self) -> Result<()> {
        require(self.kind(), "ProjectKey", &self.project_key)?;
        require(self.kind(), "RepoSlug", &self.repo_slug)?;
        require(self.kind(), "FilePath", &self.file_path)
    }

    fn build_url(&self, base_url: &str) -> Result<String> {
        RepoUrl::new(base_url, &self.project_key, &self.repo_slug)
            .segment("raw")
            .path(&self.file_path)
            .param("at", &self.at)
            .build()
    }
}
