//! bbfs-rs - a Bitbucket Server repository as a read-only filesystem.

pub mod caches;
pub mod cli;
pub mod client;
pub mod config;
pub mod fs;

pub use caches::{CacheConfig, ResponseCache};
pub use client::{Client, ClientError, SecretString};
pub use config::{read_config, ConfigSource, FsConfig};
pub use fs::{FileInfo, FsError, Node, RepoFs};
