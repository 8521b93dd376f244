//! Configuration types for bbfs-rs.
//!
//! This module defines the structures used to represent filesystem
//! configuration as parsed from an INI-format config file.

use crate::caches::CacheConfig;
use crate::client::SecretString;

// =============================================================================
// Primitive Types
// =============================================================================

/// A size in bytes, as written in config files (`64K`, `10MB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

// =============================================================================
// Config Sections
// =============================================================================

/// [server] section - where the REST API lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `https` or `http`.
    pub scheme: String,
    pub host: String,
    pub api_path: String,
    pub api_version: String,
    pub access_key: SecretString,
}

/// [repository] section - which repository, which revision, which subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub project_key: String,
    pub slug: String,
    /// Directory inside the repository that acts as the filesystem root.
    pub root: String,
    /// Branch, tag or commit; empty means the default branch.
    pub at: String,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Everything needed to build a [`RepoFs`](crate::fs::RepoFs).
///
/// Read once when the filesystem is constructed, never consulted again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfig {
    pub server: ServerConfig,
    pub repository: RepositoryConfig,
    pub cache: CacheConfig,
    /// Entries requested per directory listing page.
    pub page_size: u32,
}

impl FsConfig {
    /// `{scheme}://{host}{api_path}/{api_version}`, with redundant slashes
    /// between the parts removed.
    pub fn base_url(&self) -> String {
        let api_path = self.server.api_path.trim_matches('/');
        let version = self.server.api_version.trim_matches('/');
        let mut url = format!("{}://{}", self.server.scheme, self.server.host.trim_end_matches('/'));
        for part in [api_path, version] {
            if !part.is_empty() {
                url.push('/');
                url.push_str(part);
            }
        }
        url
    }
}
