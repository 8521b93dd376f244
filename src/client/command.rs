//! The command protocol shared by every remote operation.
//!
//! A command is a plain value holding the repository coordinates it needs. It
//! can check itself, turn itself into a request URL, and (for commands whose
//! body is decoded rather than streamed) parse the response body into its
//! typed result. [`Client::execute`](crate::client::Client::execute) drives
//! the whole pipeline generically over [`Command::Output`].

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::error::{ClientError, Result};

// =============================================================================
// Command Kinds
// =============================================================================

/// Tag naming each remote operation, used for logging and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    FetchFileContent,
    ListTags,
    ListDirectoryEntries,
    OpenRawFile,
    ListCommits,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::FetchFileContent => "GetFileContent",
            CommandKind::ListTags => "GetTags",
            CommandKind::ListDirectoryEntries => "GetFiles",
            CommandKind::OpenRawFile => "OpenRawFile",
            CommandKind::ListCommits => "GetCommits",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A remote operation that knows how to check itself and build its URL.
pub trait RemoteRequest: Send + Sync {
    /// Which operation this is.
    fn kind(&self) -> CommandKind;

    /// Check that all mandatory coordinates are present.
    fn validate(&self) -> Result<()>;

    /// Build the full request URL from the API base URL.
    ///
    /// Must be deterministic: the result is also the cache key.
    fn build_url(&self, base_url: &str) -> Result<String>;
}

/// A remote operation whose response body is decoded into a typed result.
pub trait Command: RemoteRequest {
    type Output: Send;

    /// Decode a complete response body.
    fn parse_response(&self, body: &[u8]) -> Result<Self::Output>;
}

/// Fail with a validation error naming `field` if `value` is empty.
pub(crate) fn require(kind: CommandKind, field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ClientError::Validation {
            command: kind,
            field,
        });
    }
    Ok(())
}

// =============================================================================
// Pagination
// =============================================================================

/// Position of one page request within a paginated listing.
///
/// A zero `start` or `limit` is left out of the query string, letting the
/// server apply its defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    pub start: u32,
    pub limit: u32,
}

impl PageCursor {
    /// The first page, with the given page size.
    pub fn first(limit: u32) -> Self {
        Self { start: 0, limit }
    }

    /// The same page size, starting at `start`.
    pub fn at(self, start: u32) -> Self {
        Self { start, ..self }
    }
}

fn default_last_page() -> bool {
    true
}

/// Pagination envelope returned alongside every paged listing.
///
/// A body that carries no envelope at all is treated as a single, final page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub start: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default = "default_last_page")]
    pub is_last_page: bool,
    #[serde(default)]
    pub next_page_start: u32,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            start: 0,
            size: 0,
            limit: 0,
            is_last_page: true,
            next_page_start: 0,
        }
    }
}

impl PageInfo {
    /// The cursor for the page after this one, if there is one.
    pub fn next_cursor(&self, current: PageCursor) -> Option<PageCursor> {
        if self.is_last_page {
            None
        } else {
            Some(current.at(self.next_page_start))
        }
    }
}

// =============================================================================
// URL Building
// =============================================================================

/// Builds `{base}/projects/{key}/repos/{slug}/...` URLs.
///
/// Path segments are percent-encoded one by one, empty segments are skipped,
/// and query parameters are only added when non-empty (strings) or non-zero
/// (integers).
#[derive(Debug, Clone)]
pub(crate) struct RepoUrl {
    base: String,
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
}

impl RepoUrl {
    pub(crate) fn new(base_url: &str, project_key: &str, repo_slug: &str) -> Self {
        Self {
            base: base_url.to_string(),
            segments: vec![
                "projects".to_string(),
                project_key.to_string(),
                "repos".to_string(),
                repo_slug.to_string(),
            ],
            query: Vec::new(),
        }
    }

    /// Append a single path segment.
    pub(crate) fn segment(mut self, segment: &str) -> Self {
        if !segment.is_empty() {
            self.segments.push(segment.to_string());
        }
        self
    }

    /// Append a slash-separated repository path.
    pub(crate) fn path(mut self, path: &str) -> Self {
        self.segments.extend(
            path.split('/')
                .filter(|s| !s.is_empty() && *s != ".")
                .map(str::to_string),
        );
        self
    }

    pub(crate) fn param(mut self, name: &'static str, value: &str) -> Self {
        if !value.is_empty() {
            self.query.push((name, value.to_string()));
        }
        self
    }

    pub(crate) fn param_u32(mut self, name: &'static str, value: u32) -> Self {
        if value != 0 {
            self.query.push((name, value.to_string()));
        }
        self
    }

    pub(crate) fn cursor(self, cursor: PageCursor) -> Self {
        self.param_u32("start", cursor.start)
            .param_u32("limit", cursor.limit)
    }

    pub(crate) fn build(self) -> Result<String> {
        let invalid = |message: String| ClientError::InvalidUrl {
            url: self.base.clone(),
            message,
        };

        let mut url = Url::parse(&self.base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("not a base url".to_string()))?
            .pop_if_empty()
            .extend(&self.segments);

        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://bitbucket.example.com/rest/api/latest";

    #[test]
    fn test_repo_url_plain() {
        let url = RepoUrl::new(BASE, "P", "R").segment("tags").build().unwrap();
        assert_eq!(
            url,
            "https://bitbucket.example.com/rest/api/latest/projects/P/repos/R/tags"
        );
    }

    #[test]
    fn test_repo_url_omits_empty_and_zero_params() {
        let url = RepoUrl::new(BASE, "P", "R")
            .segment("browse")
            .path("")
            .param("at", "")
            .cursor(PageCursor::default())
            .build()
            .unwrap();
        assert_eq!(
            url,
            "https://bitbucket.example.com/rest/api/latest/projects/P/repos/R/browse"
        );
        assert!(!url.contains('?'));
    }

    #[test]
    fn test_repo_url_path_and_params() {
        let url = RepoUrl::new(BASE, "~user", "repo")
            .segment("browse")
            .path("src/my file.rs")
            .param("at", "refs/heads/main")
            .cursor(PageCursor { start: 25, limit: 0 })
            .build()
            .unwrap();
        assert_eq!(
            url,
            "https://bitbucket.example.com/rest/api/latest/projects/~user/repos/repo/browse/src/my%20file.rs?at=refs%2Fheads%2Fmain&start=25"
        );
    }

    #[test]
    fn test_repo_url_trailing_slash_base() {
        let url = RepoUrl::new("http://localhost:7990/rest/api/1.0/", "P", "R")
            .segment("commits")
            .build()
            .unwrap();
        assert_eq!(url, "http://localhost:7990/rest/api/1.0/projects/P/repos/R/commits");
    }

    #[test]
    fn test_repo_url_invalid_base() {
        let err = RepoUrl::new("not a url", "P", "R").build().unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
    }

    #[test]
    fn test_page_info_defaults_to_last_page() {
        let info: PageInfo = serde_json::from_str("{}").unwrap();
        assert!(info.is_last_page);
        assert_eq!(info.next_cursor(PageCursor::first(10)), None);

        let info: PageInfo =
            serde_json::from_str(r#"{"isLastPage":false,"nextPageStart":10,"start":0}"#).unwrap();
        assert_eq!(
            info.next_cursor(PageCursor::first(10)),
            Some(PageCursor { start: 10, limit: 10 })
        );
    }
}
