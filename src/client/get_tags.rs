use serde::{Deserialize, Serialize};

use crate::client::command::{
    require, Command, CommandKind, PageCursor, PageInfo, RemoteRequest, RepoUrl,
};
use crate::client::error::{ClientError, Result};

/// List the tags of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTagsCommand {
    pub project_key: String,
    pub repo_slug: String,
    /// `ALPHABETICAL` or `MODIFICATION`; empty leaves the server default.
    pub order_by: String,
    pub cursor: PageCursor,
}

impl GetTagsCommand {
    pub fn with_cursor(&self, cursor: PageCursor) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

/// One repository tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Fully qualified ref, e.g. `refs/tags/v1.0`.
    pub id: String,
    /// Display name, e.g. `v1.0`.
    pub name: String,
    /// The commit the tag points at.
    pub commit_id: String,
    /// `TAG` for annotated and lightweight tags alike.
    pub kind: String,
}

/// One page of tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPage {
    pub tags: Vec<Tag>,
    pub page: PageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagValue {
    #[serde(default)]
    id: String,
    display_id: String,
    #[serde(default)]
    latest_commit: String,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    values: Vec<TagValue>,
    #[serde(flatten)]
    page: PageInfo,
}

impl RemoteRequest for GetTagsCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::ListTags
    }

    fn validate(&self) -> Result<()> {
        require(self.kind(), "ProjectKey", &self.project_key)?;
        require(self.kind(), "RepoSlug", &self.repo_slug)
    }

    fn build_url(&self, base_url: &str) -> Result<String> {
        RepoUrl::new(base_url, &self.project_key, &self.repo_slug)
            .segment("tags")
            .param("orderBy", &self.order_by)
            .cursor(self.cursor)
            .build()
    }
}

impl Command for GetTagsCommand {
    type Output = TagPage;

    fn parse_response(&self, body: &[u8]) -> Result<TagPage> {
        let resp: TagsResponse =
            serde_json::from_slice(body).map_err(|e| ClientError::parse(self.kind(), e))?;

        let tags = resp
            .values
            .into_iter()
            .map(|v| Tag {
                id: v.id,
                name: v.display_id,
                commit_id: v.latest_commit,
                kind: v.kind,
            })
            .collect();

        Ok(TagPage {
            tags,
            page: resp.page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> GetTagsCommand {
        GetTagsCommand {
            project_key: "P".to_string(),
            repo_slug: "R".to_string(),
            order_by: "ALPHABETICAL".to_string(),
            cursor: PageCursor::default(),
        }
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            command().build_url("https://host/rest/api/latest").unwrap(),
            "https://host/rest/api/latest/projects/P/repos/R/tags?orderBy=ALPHABETICAL"
        );

        let paged = command().with_cursor(PageCursor { start: 50, limit: 25 });
        assert_eq!(
            paged.build_url("https://host/rest/api/latest").unwrap(),
            "https://host/rest/api/latest/projects/P/repos/R/tags?orderBy=ALPHABETICAL&start=50&limit=25"
        );
    }

    #[test]
    fn test_parse_single_tag() {
        let page = command()
            .parse_response(
                br#"{"values":[{"displayId":"v1.0","latestCommit":"abc123","type":"TAG"}]}"#,
            )
            .unwrap();

        assert_eq!(page.tags.len(), 1);
        assert_eq!(page.tags[0].name, "v1.0");
        assert_eq!(page.tags[0].commit_id, "abc123");
        assert_eq!(page.tags[0].kind, "TAG");
        assert!(page.page.is_last_page);
    }

    #[test]
    fn test_parse_pagination_fields() {
        let page = command()
            .parse_response(
                br#"{"size":1,"limit":1,"isLastPage":false,"nextPageStart":1,"start":0,
                    "values":[{"id":"refs/tags/a","displayId":"a","latestCommit":"1","type":"TAG"}]}"#,
            )
            .unwrap();

        assert_eq!(page.tags[0].id, "refs/tags/a");
        assert!(!page.page.is_last_page);
        assert_eq!(page.page.next_page_start, 1);
    }

    #[test]
    fn test_validate_requires_slug() {
        let cmd = GetTagsCommand {
            repo_slug: String::new(),
            ..command()
        };
        assert!(matches!(
            cmd.validate(),
            Err(ClientError::Validation {
                field: "RepoSlug",
                ..
            })
        ));
    }
}
