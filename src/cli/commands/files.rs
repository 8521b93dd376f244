//! Filesystem subcommands: ls, stat, cat, content.

use clap::Args;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::fs::{FileInfo, Node, RepoFs};

const CAT_BUFFER_SIZE: usize = 64 * 1024;

fn describe(info: &FileInfo) -> String {
    if info.is_dir {
        format!("{:>12}  {}/", "-", info.name)
    } else {
        format!("{:>12}  {}", info.size, info.name)
    }
}

// =============================================================================
// Ls
// =============================================================================

/// Arguments for the ls command.
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory to list, relative to the root.
    #[arg(default_value = ".")]
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl LsArgs {
    pub async fn run(self, fs: &RepoFs, global: &GlobalArgs) -> Result<()> {
        let children = fs.read_dir(&self.path).await?;
        let infos: Vec<FileInfo> = children.iter().map(|n| n.info().clone()).collect();

        if global.json {
            self.output.write_json(&infos).await?;
        } else if !infos.is_empty() {
            let lines: Vec<String> = infos.iter().map(describe).collect();
            self.output.write_str(&lines.join("\n")).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Stat
// =============================================================================

/// Arguments for the stat command.
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Path to describe.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl StatArgs {
    pub async fn run(self, fs: &RepoFs, global: &GlobalArgs) -> Result<()> {
        let info = fs.stat(&self.path).await?;
        if global.json {
            self.output.write_json(&info).await?;
        } else {
            self.output.write_str(&describe(&info)).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Cat
// =============================================================================

/// Arguments for the cat command.
#[derive(Args, Debug)]
pub struct CatArgs {
    /// File to stream.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl CatArgs {
    /// Stream the raw file without buffering it whole.
    pub async fn run(self, fs: &RepoFs, _global: &GlobalArgs) -> Result<()> {
        let mut node = fs.open(&self.path).await?;
        let mut out = self.output.open().await?;
        let copied = copy_to(&mut node, &mut out).await?;
        tracing::debug!(path = %self.path, bytes = copied, "streamed file");
        Ok(())
    }
}

/// Copy a file node into `out`. The node's stream is released whether or
/// not the copy succeeds.
async fn copy_to<W>(node: &mut Node, out: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let result = pump(node, out).await;
    if node.close() {
        tracing::trace!(path = %node.path(), "content stream released");
    }
    result
}

async fn pump<W>(node: &mut Node, out: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; CAT_BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        let n = node.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await?;
        copied += n as u64;
    }
    out.flush().await?;
    Ok(copied)
}

// =============================================================================
// Content
// =============================================================================

/// Arguments for the content command.
#[derive(Args, Debug)]
pub struct ContentArgs {
    /// File to fetch.
    pub path: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ContentArgs {
    /// Fetch a file through the line-oriented representation.
    pub async fn run(self, fs: &RepoFs, _global: &GlobalArgs) -> Result<()> {
        let content = fs.read_file(&self.path).await?;
        self.output.write_bytes(&content).await?;
        Ok(())
    }
}
