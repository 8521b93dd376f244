use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::command::{
    require, Command, CommandKind, PageCursor, PageInfo, RemoteRequest, RepoUrl,
};
use crate::client::error::{ClientError, Result};

/// List commits, or fetch one commit when `commit_id` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetCommitsCommand {
    pub project_key: String,
    pub repo_slug: String,
    pub order_by: String,
    pub cursor: PageCursor,
    pub commit_id: String,
}

impl GetCommitsCommand {
    pub fn with_cursor(&self, cursor: PageCursor) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

/// An author or committer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub id: String,
    pub author: Person,
    pub author_timestamp: DateTime<Utc>,
    pub committer: Person,
    pub committer_timestamp: DateTime<Utc>,
    pub message: String,
}

/// One page of commits. A single-commit lookup yields a one-element final page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitsPage {
    pub commits: Vec<Commit>,
    pub page: PageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitValue {
    #[serde(default)]
    id: String,
    #[serde(default)]
    author: Person,
    #[serde(default)]
    author_timestamp: i64,
    #[serde(default)]
    committer: Person,
    #[serde(default)]
    committer_timestamp: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct CommitsResponse {
    #[serde(default)]
    values: Vec<CommitValue>,
    #[serde(flatten)]
    page: PageInfo,
}

impl GetCommitsCommand {
    fn to_commit(&self, v: CommitValue) -> Result<Commit> {
        let timestamp = |ms: i64| {
            DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
                ClientError::parse(self.kind(), format!("timestamp out of range: {ms}"))
            })
        };
        Ok(Commit {
            author_timestamp: timestamp(v.author_timestamp)?,
            committer_timestamp: timestamp(v.committer_timestamp)?,
            id: v.id,
            author: v.author,
            committer: v.committer,
            message: v.message,
        })
    }
}

impl RemoteRequest for GetCommitsCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::ListCommits
    }

    fn validate(&self) -> Result<()> {
        require(self.kind(), "ProjectKey", &self.project_key)?;
        require(self.kind(), "RepoSlug", &self.repo_slug)
    }

    fn build_url(&self, base_url: &str) -> Result<String> {
        RepoUrl::new(base_url, &self.project_key, &self.repo_slug)
            .segment("commits")
            .segment(&self.commit_id)
            .param("orderBy", &self.order_by)
            .cursor(self.cursor)
            .build()
    }
}

impl Command for GetCommitsCommand {
    type Output = CommitsPage;

    fn parse_response(&self, body: &[u8]) -> Result<CommitsPage> {
        if !self.commit_id.is_empty() {
            let value: CommitValue =
                serde_json::from_slice(body).map_err(|e| ClientError::parse(self.kind(), e))?;
            return Ok(CommitsPage {
                commits: vec![self.to_commit(value)?],
                page: PageInfo::default(),
            });
        }

        let resp: CommitsResponse =
            serde_json::from_slice(body).map_err(|e| ClientError::parse(self.kind(), e))?;
        let commits = resp
            .values
            .into_iter()
            .map(|v| self.to_commit(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(CommitsPage {
            commits,
            page: resp.page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn command() -> GetCommitsCommand {
        GetCommitsCommand {
            project_key: "P".to_string(),
            repo_slug: "R".to_string(),
            ..GetCommitsCommand::default()
        }
    }

    const COMMIT: &str = r#"{
        "id":"def456",
        "author":{"name":"Ann","emailAddress":"ann@example.com"},
        "authorTimestamp":1700000000000,
        "committer":{"name":"Bob","emailAddress":"bob@example.com"},
        "committerTimestamp":1700000060000,
        "message":"Fix the build"
    }"#;

    #[test]
    fn test_build_url() {
        assert_eq!(
            command().build_url("https://host/rest/api/latest").unwrap(),
            "https://host/rest/api/latest/projects/P/repos/R/commits"
        );

        let single = GetCommitsCommand {
            commit_id: "def456".to_string(),
            order_by: "NEWEST".to_string(),
            ..command()
        };
        assert_eq!(
            single.build_url("https://host/rest/api/latest").unwrap(),
            "https://host/rest/api/latest/projects/P/repos/R/commits/def456?orderBy=NEWEST"
        );
    }

    #[test]
    fn test_parse_single_commit() {
        let cmd = GetCommitsCommand {
            commit_id: "def456".to_string(),
            ..command()
        };
        let page = cmd.parse_response(COMMIT.as_bytes()).unwrap();

        assert_eq!(page.commits.len(), 1);
        let commit = &page.commits[0];
        assert_eq!(commit.id, "def456");
        assert_eq!(commit.author.email_address, "ann@example.com");
        assert_eq!(commit.committer.name, "Bob");
        assert_eq!(
            commit.committer_timestamp,
            Utc.timestamp_opt(1_700_000_060, 0).unwrap()
        );
        assert!(page.page.is_last_page);
    }

    #[test]
    fn test_parse_commit_list() {
        let body = format!(
            r#"{{"values":[{COMMIT},{COMMIT}],"isLastPage":false,"nextPageStart":2,"start":0,"size":2,"limit":2}}"#
        );
        let page = command().parse_response(body.as_bytes()).unwrap();

        assert_eq!(page.commits.len(), 2);
        assert_eq!(page.commits[1].message, "Fix the build");
        assert_eq!(page.page.next_page_start, 2);
        assert!(!page.page.is_last_page);
    }

    #[test]
    fn test_parse_list_rejects_non_object() {
        let err = command().parse_response(b"[1,2]").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Parse {
                command: CommandKind::ListCommits,
                ..
            }
        ));
    }
}
