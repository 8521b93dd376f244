use serde::Deserialize;

use crate::client::command::{require, Command, CommandKind, RemoteRequest, RepoUrl};
use crate::client::error::{ClientError, Result};

/// Fetch a file's content through the line-array `raw` representation.
///
/// The decoded body goes through the response cache, so repeated reads of the
/// same file at the same revision cost one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetFileContentCommand {
    pub project_key: String,
    pub repo_slug: String,
    pub file_path: String,
    /// Branch, tag or commit. Empty means the default branch.
    pub at: String,
}

#[derive(Deserialize)]
struct LinesResponse {
    lines: Vec<Line>,
}

#[derive(Deserialize)]
struct Line {
    #[serde(default)]
    text: String,
}

impl RemoteRequest for GetFileContentCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::FetchFileContent
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

impl Command for GetFileContentCommand {
    type Output = Vec<u8>;

    /// Rejoin the `lines[].text` array, terminating every line with `\n`.
    fn parse_response(&self, body: &[u8]) -> Result<Vec<u8>> {
        let resp: LinesResponse =
            serde_json::from_slice(body).map_err(|e| ClientError::parse(self.kind(), e))?;

        let mut content = Vec::with_capacity(resp.lines.iter().map(|l| l.text.len() + 1).sum());
        for line in resp.lines {
            content.extend_from_slice(line.text.as_bytes());
            content.push(b'\n');
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> GetFileContentCommand {
        GetFileContentCommand {
            project_key: "P".to_string(),
            repo_slug: "R".to_string(),
            file_path: "docs/README.md".to_string(),
            at: String::new(),
        }
    }

    #[test]
    fn test_parse_lines() {
        let content = command()
            .parse_response(br#"{"lines":[{"text":"hello"},{"text":"world"}]}"#)
            .unwrap();
        assert_eq!(content, b"hello\nworld\n");
    }

    #[test]
    fn test_parse_empty_file() {
        let content = command().parse_response(br#"{"lines":[]}"#).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_parse_rejects_raw_bytes() {
        let err = command().parse_response(b"plain text").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Parse {
                command: CommandKind::FetchFileContent,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_requires_file_path() {
        let cmd = GetFileContentCommand {
            file_path: String::new(),
            ..command()
        };
        let err = cmd.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "GetFileContent command not valid: FilePath is missing"
        );
    }

    #[test]
    fn test_build_url_with_revision() {
        let cmd = GetFileContentCommand {
            at: "v1.0".to_string(),
            ..command()
        };
        assert_eq!(
            cmd.build_url("https://host/rest/api/latest").unwrap(),
            "https://host/rest/api/latest/projects/P/repos/R/raw/docs/README.md?at=v1.0"
        );
    }
}
