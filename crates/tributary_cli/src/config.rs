//! Configuration file support for tributary.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `TRIBUTARY_`, sections split by
//!    `__`, e.g. `TRIBUTARY_GITHUB__TOKEN`)
//! 3. Config file (~/.config/tributary/config.toml or ./tributary.toml)
//! 4. Built-in defaults
//!
//! Caches default to `~/.local/state/tributary` on Linux (the XDG state
//! directory), one SQLite file per repository or Jira account below it.
//!
//! Example config file:
//! ```toml
//! [cache]
//! dir = "/var/cache/tributary"  # optional
//!
//! [github]
//! token = "ghp_..."
//! base_url = "https://github.example.com/api/v3"  # GitHub Enterprise
//! requests_per_second = 10
//!
//! [jira]
//! host = "acme.atlassian.net"
//! user = "ops@acme.io"
//! token = "..."
//! jql = "project = OPS"
//!
//! [sync]
//! max_retries = 5
//! max_pages = 100
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use tributary::fetch::DEFAULT_MAX_PAGES;
use tributary::retry::DEFAULT_MAX_RETRIES;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub github: GitHubConfig,
    pub jira: JiraConfig,
    pub sync: SyncConfig,
}

/// Where caches live.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory of all caches.
    pub dir: Option<PathBuf>,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    pub token: Option<String>,
    /// API root, for GitHub Enterprise.
    pub base_url: Option<String>,
    /// Client-side request budget; 0 disables rate limiting.
    pub requests_per_second: Option<u32>,
}

/// Jira configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Jira host, with or without scheme.
    pub host: Option<String>,
    /// Account email used for basic auth.
    pub user: Option<String>,
    /// API token.
    pub token: Option<String>,
    /// Issue filter; every visible issue when unset.
    pub jql: Option<String>,
    /// Client-side request budget; 0 disables rate limiting.
    pub requests_per_second: Option<u32>,
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Retries per request before giving up.
    pub max_retries: u32,
    /// Page ceiling per list request.
    pub max_pages: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/tributary/config.toml)
    /// 3. Local config file (./tributary.toml)
    /// 4. Environment variables with TRIBUTARY_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let local_config = PathBuf::from("tributary.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./tributary.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., TRIBUTARY_SYNC__MAX_RETRIES -> sync.max_retries
        builder = builder.add_source(
            Environment::with_prefix("TRIBUTARY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Cache root, falling back to the default state directory.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.cache.dir.clone().or_else(Self::default_state_dir)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tributary").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/tributary` or `~/.local/state/tributary`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tributary").map(|dirs| {
            // state_dir() returns None on macOS/Windows
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
