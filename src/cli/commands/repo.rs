//! Repository metadata subcommands: tags, commits.

use clap::Args;

use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::client::{Commit, PageCursor};
use crate::fs::RepoFs;

// =============================================================================
// Tags
// =============================================================================

/// Arguments for the tags command.
#[derive(Args, Debug)]
pub struct TagsArgs {
    /// ALPHABETICAL or MODIFICATION.
    #[arg(long = "order-by", env = "BBFS_ORDER_BY", default_value = "MODIFICATION")]
    pub order_by: String,

    /// Tags fetched per page; 0 keeps the configured page size.
    #[arg(long, env = "BBFS_LIMIT", default_value_t = 0)]
    pub limit: u32,

    #[command(flatten)]
    pub output: OutputSink,
}

impl TagsArgs {
    /// Lists every tag; `--limit` only changes how many come per request.
    pub async fn run(self, fs: &RepoFs, global: &GlobalArgs) -> Result<()> {
        let tags = if self.limit > 0 {
            fs.clone().with_page_size(self.limit).tags(&self.order_by).await?
        } else {
            fs.tags(&self.order_by).await?
        };

        if global.json {
            self.output.write_json(&tags).await?;
        } else if !tags.is_empty() {
            let lines: Vec<String> = tags
                .iter()
                .map(|t| format!("{}  {}", t.name, t.commit_id))
                .collect();
            self.output.write_str(&lines.join("\n")).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Commits
// =============================================================================

/// Arguments for the commits command.
#[derive(Args, Debug)]
pub struct CommitsArgs {
    /// Show a single commit instead of a listing.
    #[arg(long = "commit-id", env = "BBFS_COMMIT_ID")]
    pub commit_id: Option<String>,

    /// Listing order, passed through to the server.
    #[arg(long = "order-by", env = "BBFS_ORDER_BY")]
    pub order_by: Option<String>,

    /// Index of the first commit to list.
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// Maximum number of commits to list; 0 leaves the server default.
    #[arg(long, env = "BBFS_LIMIT", default_value_t = 25)]
    pub limit: u32,

    #[command(flatten)]
    pub output: OutputSink,
}

fn one_line(commit: &Commit) -> String {
    let short_id: String = commit.id.chars().take(12).collect();
    let subject = commit.message.lines().next().unwrap_or_default();
    format!(
        "{}  {}  {}  {}",
        short_id,
        commit.committer_timestamp.format("%Y-%m-%d %H:%M"),
        commit.committer.name,
        subject
    )
}

impl CommitsArgs {
    pub async fn run(self, fs: &RepoFs, global: &GlobalArgs) -> Result<()> {
        let commits = match &self.commit_id {
            Some(id) => vec![fs.commit(id).await?],
            None => {
                let cursor = PageCursor {
                    start: self.start,
                    limit: self.limit,
                };
                fs.commits(self.order_by.as_deref().unwrap_or_default(), cursor)
                    .await?
                    .commits
            }
        };

        if global.json {
            self.output.write_json(&commits).await?;
        } else if !commits.is_empty() {
            let lines: Vec<String> = commits.iter().map(one_line).collect();
            self.output.write_str(&lines.join("\n")).await?;
        }
        Ok(())
    }
}
