use serde::{Deserialize, Serialize};

use crate::client::command::{
    require, Command, CommandKind, PageCursor, PageInfo, RemoteRequest, RepoUrl,
};
use crate::client::error::{ClientError, Result};

/// Browse one page of a directory's children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetFilesCommand {
    pub project_key: String,
    pub repo_slug: String,
    /// Directory to list, slash separated. Empty lists the repository root.
    pub file_path: String,
    pub at: String,
    pub cursor: PageCursor,
}

impl GetFilesCommand {
    /// The same listing at a different page.
    pub fn with_cursor(&self, cursor: PageCursor) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Anything the server does not call a directory is read as a file.
    fn from_type(t: &str) -> Self {
        if t == "DIRECTORY" {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }
}

/// One child of a browsed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEntry {
    pub name: String,
    /// Size in bytes, 0 for directories.
    pub size: u64,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One fetched page of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesPage {
    pub entries: Vec<RemoteEntry>,
    pub page: PageInfo,
}

#[derive(Deserialize)]
struct BrowseResponse {
    children: Children,
}

#[derive(Deserialize)]
struct Children {
    #[serde(default)]
    values: Vec<ChildValue>,
    #[serde(flatten)]
    page: PageInfo,
}

#[derive(Deserialize)]
struct ChildValue {
    path: ChildPath,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
}

#[derive(Deserialize)]
struct ChildPath {
    #[serde(default)]
    components: Vec<String>,
    #[serde(default)]
    name: Option<String>,
}

impl RemoteRequest for GetFilesCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::ListDirectoryEntries
    }

    fn validate(&self) -> Result<()> {
        require(self.kind(), "ProjectKey", &self.project_key)?;
        require(self.kind(), "RepoSlug", &self.repo_slug)
    }

    fn build_url(&self, base_url: &str) -> Result<String> {
        RepoUrl::new(base_url, &self.project_key, &self.repo_slug)
            .segment("browse")
            .path(&self.file_path)
            .param("at", &self.at)
            .cursor(self.cursor)
            .build()
    }
}

impl Command for GetFilesCommand {
    type Output = FilesPage;

    fn parse_response(&self, body: &[u8]) -> Result<FilesPage> {
        let resp: BrowseResponse =
            serde_json::from_slice(body).map_err(|e| ClientError::parse(self.kind(), e))?;

        let entries = resp
            .children
            .values
            .into_iter()
            .map(|v| {
                let name = v
                    .path
                    .components
                    .into_iter()
                    .next()
                    .or(v.path.name)
                    .ok_or_else(|| ClientError::parse(self.kind(), "entry without a path"))?;
                let kind = EntryKind::from_type(&v.kind);
                let size = if kind == EntryKind::Directory { 0 } else { v.size };
                Ok(RemoteEntry { name, size, kind })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FilesPage {
            entries,
            page: resp.children.page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> GetFilesCommand {
        GetFilesCommand {
            project_key: "P".to_string(),
            repo_slug: "R".to_string(),
            ..GetFilesCommand::default()
        }
    }

    #[test]
    fn test_build_url_root_listing() {
        let cmd = command().with_cursor(PageCursor::first(1000));
        assert_eq!(
            cmd.build_url("https://host/rest/api/latest").unwrap(),
            "https://host/rest/api/latest/projects/P/repos/R/browse?limit=1000"
        );
    }

    #[test]
    fn test_build_url_nested() {
        let cmd = GetFilesCommand {
            file_path: "server/cmd".to_string(),
            at: "develop".to_string(),
            cursor: PageCursor { start: 3, limit: 3 },
            ..command()
        };
        assert_eq!(
            cmd.build_url("https://host/rest/api/latest").unwrap(),
            "https://host/rest/api/latest/projects/P/repos/R/browse/server/cmd?at=develop&start=3&limit=3"
        );
    }

    #[test]
    fn test_parse_children() {
        let page = command()
            .parse_response(
                br#"{"path":{"components":["server"]},"children":{
                    "size":2,"limit":2,"isLastPage":false,"nextPageStart":2,"start":0,
                    "values":[
                        {"path":{"components":["main.go"],"name":"main.go"},"type":"FILE","size":120},
                        {"path":{"components":["internal"],"name":"internal"},"type":"DIRECTORY"}
                    ]}}"#,
            )
            .unwrap();

        assert_eq!(
            page.entries,
            vec![
                RemoteEntry {
                    name: "main.go".to_string(),
                    size: 120,
                    kind: EntryKind::File,
                },
                RemoteEntry {
                    name: "internal".to_string(),
                    size: 0,
                    kind: EntryKind::Directory,
                },
            ]
        );
        assert!(!page.page.is_last_page);
        assert_eq!(page.page.next_page_start, 2);
    }

    #[test]
    fn test_parse_name_fallback_and_unknown_type() {
        let page = command()
            .parse_response(
                br#"{"children":{"isLastPage":true,"values":[
                    {"path":{"name":"vendored"},"type":"SUBMODULE","size":0}]}}"#,
            )
            .unwrap();
        assert_eq!(page.entries[0].name, "vendored");
        assert_eq!(page.entries[0].kind, EntryKind::File);
    }

    #[test]
    fn test_parse_missing_children() {
        let err = command().parse_response(br#"{"lines":[]}"#).unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));
    }
}
