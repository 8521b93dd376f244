//! Flags shared by every bbfs command, and where command output goes.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::ConfigSource;

// =============================================================================
// Error Types
// =============================================================================

/// Failures while emitting command output.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A result could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArgsError>;

// =============================================================================
// Global Arguments
// =============================================================================

/// Connection, repository and config flags accepted by every command.
///
/// Connection flags fall back to `BBFS_*` environment variables and, when
/// given, override whatever the config files say.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Base INI config file (default: $BBFS_CONFIG_FILE, then ~/.bbfsconfig).
    #[arg(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// INI file layered over the base config file.
    #[arg(long = "config-file-overrides", global = true)]
    pub config_file_overrides: Option<PathBuf>,

    /// Configuration overrides in the form section.key=value.
    #[arg(long = "config", value_parser = parse_config_override, global = true)]
    pub config_overrides: Vec<(String, String)>,

    /// Server host name, optionally with a port.
    #[arg(long, env = "BBFS_HOST", global = true)]
    pub host: Option<String>,

    /// REST API version path element.
    #[arg(long = "api-version", env = "BBFS_API_VERSION", global = true)]
    pub api_version: Option<String>,

    /// Project key, or `~user` for a personal repository.
    #[arg(long = "project-key", env = "BBFS_PROJECT_KEY", global = true)]
    pub project_key: Option<String>,

    /// Repository slug.
    #[arg(long = "repo-slug", env = "BBFS_REPO_SLUG", global = true)]
    pub repo_slug: Option<String>,

    /// Personal access token sent as a bearer credential.
    #[arg(long = "access-key", env = "BBFS_ACCESS_KEY", hide_env_values = true, global = true)]
    pub access_key: Option<String>,

    /// Branch, tag or commit to read.
    #[arg(long, env = "BBFS_AT", global = true)]
    pub at: Option<String>,

    /// Directory inside the repository to treat as the root.
    #[arg(long, env = "BBFS_ROOT", global = true)]
    pub root: Option<String>,

    /// Print structured results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// The config layers these flags describe. Dedicated flags such as `--host`
    /// are applied after `--config` pairs.
    pub fn to_config_source(&self) -> ConfigSource {
        let mut overrides = self.config_overrides.clone();
        let flags = [
            ("server.host", &self.host),
            ("server.api_version", &self.api_version),
            ("server.access_key", &self.access_key),
            ("repository.project_key", &self.project_key),
            ("repository.slug", &self.repo_slug),
            ("repository.at", &self.at),
            ("repository.root", &self.root),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                overrides.push((key.to_string(), value.clone()));
            }
        }

        ConfigSource {
            config_file: self.config_file.clone(),
            override_file: self.config_file_overrides.clone(),
            overrides,
        }
    }

    /// Default log directive for the chosen verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "bbfs_rs=warn",
            1 => "bbfs_rs=debug",
            _ => "bbfs_rs=trace",
        }
    }
}

/// Split `section.key=value`.
fn parse_config_override(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected section.key=value, got '{}'", s))?;
    Ok((name.to_string(), value.to_string()))
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Destination for a command's output: stdout unless `-o` names a file.
#[derive(Args, Debug, Default)]
pub struct OutputSink {
    /// Write to this file rather than stdout.
    #[arg(id = "output_file", short = 'o', long = "output-file")]
    pub file: Option<PathBuf>,
}

impl OutputSink {
    /// Open the destination for incremental writes.
    pub async fn open(&self) -> Result<Box<dyn AsyncWrite + Unpin + Send>> {
        Ok(match &self.file {
            Some(path) => Box::new(tokio::fs::File::create(path).await?),
            None => Box::new(tokio::io::stdout()),
        })
    }

    /// Write a string value to the output, followed by a newline.
    pub async fn write_str(&self, value: &str) -> Result<()> {
        let mut out = self.open().await?;
        out.write_all(value.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }

    /// Write a value as pretty-printed JSON.
    pub async fn write_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        self.write_str(&serde_json::to_string_pretty(value)?).await
    }

    /// Write bytes unchanged.
    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        let mut out = self.open().await?;
        out.write_all(data).await?;
        out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_override() {
        assert_eq!(
            parse_config_override("cache.ttl=5m").unwrap(),
            ("cache.ttl".to_string(), "5m".to_string())
        );
        assert_eq!(
            parse_config_override("repository.at=a=b").unwrap(),
            ("repository.at".to_string(), "a=b".to_string())
        );
        assert!(parse_config_override("cache.ttl").is_err());
    }

    #[test]
    fn test_flags_override_after_config() {
        let args = GlobalArgs {
            config_overrides: vec![("server.host".to_string(), "from-config".to_string())],
            host: Some("from-flag".to_string()),
            repo_slug: Some("widgets".to_string()),
            ..GlobalArgs::default()
        };
        let source = args.to_config_source();
        assert_eq!(
            source.overrides,
            vec![
                ("server.host".to_string(), "from-config".to_string()),
                ("server.host".to_string(), "from-flag".to_string()),
                ("repository.slug".to_string(), "widgets".to_string()),
            ]
        );
    }

    #[test]
    fn test_log_directive() {
        let mut args = GlobalArgs::default();
        assert_eq!(args.log_directive(), "bbfs_rs=warn");
        args.verbose = 2;
        assert_eq!(args.log_directive(), "bbfs_rs=trace");
    }

    #[tokio::test]
    async fn test_output_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = OutputSink {
            file: Some(path.clone()),
        };
        sink.write_str("hello").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
