//! Loading `FsConfig` from INI files, the environment and command-line
//! overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use configparser::ini::Ini;
use thiserror::Error;

use super::{ByteSize, FsConfig, RepositoryConfig, ServerConfig};
use crate::caches::{
    CacheConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, DEFAULT_MAX_BODY_SIZE,
};
use crate::client::SecretString;

// =============================================================================
// Defaults
// =============================================================================

const DEFAULT_SCHEME: &str = "https";
const DEFAULT_API_PATH: &str = "/rest/api";
const DEFAULT_API_VERSION: &str = "latest";
const DEFAULT_PAGE_SIZE: u32 = 1000;

const ENV_CONFIG_FILE: &str = "BBFS_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".bbfsconfig";

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("cannot parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("bad size '{value}': {message}")]
    InvalidByteSize { value: String, message: String },

    #[error("bad duration '{value}': {message}")]
    InvalidDuration { value: String, message: String },

    #[error("bad number '{value}': {source}")]
    InvalidInteger {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid value '{value}' for key '{key}': {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("unknown config key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Where configuration comes from, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Base INI file. When unset, `$BBFS_CONFIG_FILE` and then
    /// `~/.bbfsconfig` are tried; an explicit path that is missing is an error.
    pub config_file: Option<PathBuf>,

    /// INI file read on top of the base file.
    pub override_file: Option<PathBuf>,

    /// `section.key` / value pairs, e.g. `("repository.at", "develop")`.
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// Value Parsing
// =============================================================================

/// Split `"128MiB"` into `(128, "MiB")`. The number must come first.
fn split_number(s: &str) -> Option<(&str, &str)> {
    let digits = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if digits == 0 {
        return None;
    }
    Some((&s[..digits], s[digits..].trim()))
}

impl ByteSize {
    /// Accepts plain bytes or a binary unit: `4096`, `64K`, `10MB`, `1GiB`.
    pub fn parse(s: &str) -> Result<Self> {
        let value = s.trim();
        let invalid = |message: String| ConfigError::InvalidByteSize {
            value: value.to_string(),
            message,
        };

        let (number, unit) = split_number(value).ok_or_else(|| invalid("missing number".into()))?;
        let number = number.parse::<u64>().map_err(|e| invalid(e.to_string()))?;

        let shift = match unit.to_ascii_uppercase().as_str() {
            "" | "B" => 0,
            "K" | "KB" | "KIB" => 10,
            "M" | "MB" | "MIB" => 20,
            "G" | "GB" | "GIB" => 30,
            other => return Err(invalid(format!("unknown unit '{}'", other))),
        };
        Ok(ByteSize(number.saturating_mul(1u64 << shift)))
    }
}

/// Accepts `250ms`, `90s`, `15m` or `1h`. A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let value = s.trim();
    let invalid = |message: &str| ConfigError::InvalidDuration {
        value: value.to_string(),
        message: message.to_string(),
    };

    let (number, unit) = split_number(value).ok_or_else(|| invalid("missing number"))?;
    let number = number
        .parse::<u64>()
        .map_err(|_| invalid("number out of range"))?;

    match unit.to_ascii_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(number)),
        "" | "s" => Ok(Duration::from_secs(number)),
        "m" => Ok(Duration::from_secs(number.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(number.saturating_mul(3600))),
        _ => Err(invalid("unknown unit")),
    }
}

fn parse_int<T: std::str::FromStr<Err = std::num::ParseIntError>>(value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidInteger {
        value: value.to_string(),
        source: e,
    })
}

fn parse_scheme(key: &str, value: &str) -> Result<String> {
    match value.trim().to_lowercase().as_str() {
        s @ ("http" | "https") => Ok(s.to_string()),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: "expected http or https".to_string(),
        }),
    }
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// The base file chosen by [`resolve_config_file`].
#[derive(Debug, Default)]
pub struct ResolvedConfigFile {
    /// None when no candidate exists; defaults apply.
    pub path: Option<PathBuf>,
    /// Set when `$BBFS_CONFIG_FILE` names a file that is not there.
    pub warning: Option<String>,
}

fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    if let Some(explicit) = &source.config_file {
        if !explicit.exists() {
            return Err(ConfigError::FileNotFound(explicit.clone()));
        }
        return Ok(ResolvedConfigFile {
            path: Some(explicit.clone()),
            warning: None,
        });
    }

    if let Some(from_env) = env::var_os(ENV_CONFIG_FILE).map(PathBuf::from) {
        return Ok(if from_env.exists() {
            ResolvedConfigFile {
                path: Some(from_env),
                warning: None,
            }
        } else {
            ResolvedConfigFile {
                path: None,
                warning: Some(format!(
                    "{} points at {}, which does not exist; using defaults",
                    ENV_CONFIG_FILE,
                    from_env.display()
                )),
            }
        });
    }

    let in_home = env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILENAME))
        .filter(|p| p.exists());
    Ok(ResolvedConfigFile {
        path: in_home,
        warning: None,
    })
}

// =============================================================================
// Default Config
// =============================================================================

fn default_config() -> FsConfig {
    FsConfig {
        server: ServerConfig {
            scheme: DEFAULT_SCHEME.to_string(),
            host: String::new(),
            api_path: DEFAULT_API_PATH.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_key: SecretString::default(),
        },
        repository: RepositoryConfig::default(),
        cache: CacheConfig {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: DEFAULT_CACHE_TTL,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        },
        page_size: DEFAULT_PAGE_SIZE,
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        default_config()
    }
}

// =============================================================================
// INI Parsing
// =============================================================================

/// Every key the INI files and the overrides understand, as (section, key).
const KNOWN_KEYS: &[(&str, &str)] = &[
    ("server", "scheme"),
    ("server", "host"),
    ("server", "api_path"),
    ("server", "api_version"),
    ("server", "access_key"),
    ("repository", "project_key"),
    ("repository", "slug"),
    ("repository", "root"),
    ("repository", "at"),
    ("cache", "capacity"),
    ("cache", "ttl"),
    ("cache", "max_body_size"),
    ("listing", "page_size"),
];

/// Copy every known key present in `ini` onto `config`.
fn apply_ini_to_config(config: &mut FsConfig, ini: &Ini) -> Result<()> {
    for (section, key) in KNOWN_KEYS {
        if let Some(value) = ini.get(section, key) {
            apply_value(config, section, key, &value)?;
        }
    }
    Ok(())
}

fn apply_value(config: &mut FsConfig, section: &str, param: &str, value: &str) -> Result<()> {
    let key = format!("{}.{}", section, param);
    match (section, param) {
        ("server", "scheme") => config.server.scheme = parse_scheme(&key, value)?,
        ("server", "host") => config.server.host = value.trim().to_string(),
        ("server", "api_path") => config.server.api_path = value.trim().to_string(),
        ("server", "api_version") => config.server.api_version = value.trim().to_string(),
        ("server", "access_key") => config.server.access_key = SecretString::new(value.trim()),

        ("repository", "project_key") => config.repository.project_key = value.trim().to_string(),
        ("repository", "slug") => config.repository.slug = value.trim().to_string(),
        ("repository", "root") => config.repository.root = value.trim().to_string(),
        ("repository", "at") => config.repository.at = value.trim().to_string(),

        ("cache", "capacity") => config.cache.capacity = parse_int(value)?,
        ("cache", "ttl") => config.cache.ttl = parse_duration(value)?,
        ("cache", "max_body_size") => config.cache.max_body_size = ByteSize::parse(value)?.0,

        ("listing", "page_size") => config.page_size = parse_int(value)?,

        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key,
                message: "unknown parameter".to_string(),
            })
        }
    }
    Ok(())
}

fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

fn apply_override(config: &mut FsConfig, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some((section, param)) => apply_value(config, section, param, value),
        None => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[derive(Debug)]
pub struct ConfigResult {
    pub config: FsConfig,
    /// Non-fatal problems met while loading, for the caller to log.
    pub warnings: Vec<String>,
}

/// Build an [`FsConfig`] from defaults, then the base file, then the
/// override file, then the individual overrides. Later layers win key by key.
///
/// A missing project key or slug is not an error here; it surfaces as a
/// validation failure on the first remote call.
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();
    let mut config = default_config();

    let ResolvedConfigFile { path, warning } = resolve_config_file(source)?;
    warnings.extend(warning);

    let layer = source.override_file.as_deref();
    if let Some(missing) = layer.filter(|p| !p.exists()) {
        return Err(ConfigError::FileNotFound(missing.to_path_buf()));
    }
    for file in path.as_deref().into_iter().chain(layer) {
        apply_ini_to_config(&mut config, &load_ini(file)?)?;
    }

    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_byte_sizes() {
        assert_eq!(ByteSize::parse("4096").unwrap(), ByteSize(4096));
        assert_eq!(ByteSize::parse("64K").unwrap(), ByteSize(64 << 10));
        assert_eq!(ByteSize::parse("10 MB").unwrap(), ByteSize(10 << 20));
        assert_eq!(ByteSize::parse(" 2gib ").unwrap(), ByteSize(2 << 30));
        for bad in ["", "KB", "12 parsecs", "-5", "99999999999999999999"] {
            assert!(
                matches!(ByteSize::parse(bad), Err(ConfigError::InvalidByteSize { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("3 days").is_err());
        assert!(matches!(
            parse_duration("99999999999999999999s"),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let config = FsConfig::default();
        assert_eq!(config.server.scheme, "https");
        assert_eq!(config.server.api_path, "/rest/api");
        assert_eq!(config.server.api_version, "latest");
        assert_eq!(config.cache.capacity, 10_000);
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.max_body_size, 100 * 1024 * 1024);
        assert_eq!(config.page_size, 1000);
        assert!(config.server.access_key.is_empty());
    }

    #[test]
    fn test_base_url() {
        let mut config = default_config();
        config.server.host = "bitbucket.example.com".to_string();
        assert_eq!(
            config.base_url(),
            "https://bitbucket.example.com/rest/api/latest"
        );

        config.server.scheme = "http".to_string();
        config.server.host = "localhost:7990".to_string();
        config.server.api_path = "/rest/api/".to_string();
        config.server.api_version = "1.0".to_string();
        assert_eq!(config.base_url(), "http://localhost:7990/rest/api/1.0");
    }

    #[test]
    fn test_apply_override() {
        let mut config = default_config();
        apply_override(&mut config, "server.host", "git.example.org").unwrap();
        apply_override(&mut config, "repository.slug", "widgets").unwrap();
        apply_override(&mut config, "cache.ttl", "5m").unwrap();
        apply_override(&mut config, "cache.max_body_size", "1MB").unwrap();
        apply_override(&mut config, "listing.page_size", "3").unwrap();

        assert_eq!(config.server.host, "git.example.org");
        assert_eq!(config.repository.slug, "widgets");
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cache.max_body_size, 1024 * 1024);
        assert_eq!(config.page_size, 3);
    }

    #[test]
    fn test_apply_override_errors() {
        let mut config = default_config();
        assert!(matches!(
            apply_override(&mut config, "host", "x"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "server.port", "80"),
            Err(ConfigError::InvalidOverrideKey { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "server.scheme", "ftp"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            apply_override(&mut config, "listing.page_size", "-1"),
            Err(ConfigError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_ini_layers_onto_defaults() {
        let mut ini = Ini::new();
        ini.read(
            r#"
[server]
host = bitbucket.example.com
api_version = 1.0
access_key = abc

[repository]
project_key = PLAT
slug = services
root = deploy
at = refs/tags/v2

[cache]
capacity = 500
ttl = 10m
"#
            .to_string(),
        )
        .unwrap();

        let mut config = default_config();
        apply_ini_to_config(&mut config, &ini).unwrap();

        assert_eq!(config.server.host, "bitbucket.example.com");
        assert_eq!(config.server.api_version, "1.0");
        assert_eq!(config.server.access_key.expose(), "abc");
        assert_eq!(config.repository.project_key, "PLAT");
        assert_eq!(config.repository.slug, "services");
        assert_eq!(config.repository.root, "deploy");
        assert_eq!(config.repository.at, "refs/tags/v2");
        assert_eq!(config.cache.capacity, 500);
        assert_eq!(config.cache.ttl, Duration::from_secs(600));
        // untouched keys keep their defaults
        assert_eq!(config.server.api_path, "/rest/api");
        assert_eq!(config.page_size, 1000);
    }

    #[test]
    fn test_read_config_layers_files_and_overrides() {
        let mut base = tempfile::NamedTempFile::new().unwrap();
        writeln!(base, "[server]\nhost = base.example.com\n[repository]\nslug = one").unwrap();
        let mut layer = tempfile::NamedTempFile::new().unwrap();
        writeln!(layer, "[repository]\nslug = two\nproject_key = P").unwrap();

        let result = read_config(&ConfigSource {
            config_file: Some(base.path().to_path_buf()),
            override_file: Some(layer.path().to_path_buf()),
            overrides: vec![("repository.at".to_string(), "develop".to_string())],
        })
        .unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(result.config.server.host, "base.example.com");
        assert_eq!(result.config.repository.slug, "two");
        assert_eq!(result.config.repository.project_key, "P");
        assert_eq!(result.config.repository.at, "develop");
    }

    #[test]
    fn test_read_config_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ini");
        let err = read_config(&ConfigSource {
            config_file: Some(missing.clone()),
            ..ConfigSource::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(p) if p == missing));
    }
}
