//! Configuration module.

mod read_config;
mod types;

pub use read_config::{parse_duration, read_config, ConfigError, ConfigResult, ConfigSource};
pub use types::{ByteSize, FsConfig, RepositoryConfig, ServerConfig};
