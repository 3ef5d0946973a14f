//! Tributary CLI - incremental sync of GitHub and Jira data into local caches.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tributary::{AbortSignal, CacheScope};

use crate::commands::shared::{RepoSlug, parse_since};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(version)]
#[command(about = "Incrementally sync GitHub and Jira data into a local cache")]
#[command(
    long_about = "Tributary pulls pull requests, commits, GitHub Actions runs and workflows, \
and Jira issues into a local SQLite cache. Each run only fetches what changed since the \
last finished run; an interrupted run resumes from there."
)]
#[command(after_long_help = r#"EXAMPLES
    Sync a GitHub repository:
        $ tributary sync github rust-lang/rust

    Ignore anything older than a date on the first sync:
        $ tributary sync github rust-lang/rust --since 2024-01-01

    Sync Jira issues matching a query:
        $ tributary sync jira --jql "project = OPS"

    Show when each entity type was last synced:
        $ tributary status github rust-lang/rust

CONFIGURATION
    Tributary reads configuration from:
      1. ~/.config/tributary/config.toml (or $XDG_CONFIG_HOME/tributary/config.toml)
      2. ./tributary.toml
      3. Environment variables (TRIBUTARY_* prefix, e.g., TRIBUTARY_GITHUB__TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    TRIBUTARY_CACHE__DIR       Cache root (default: ~/.local/state/tributary)
    TRIBUTARY_GITHUB__TOKEN    GitHub personal access token
    TRIBUTARY_JIRA__HOST       Jira host
    TRIBUTARY_JIRA__USER       Jira account email
    TRIBUTARY_JIRA__TOKEN      Jira API token
    RUST_LOG                   Log filter (default: tributary=info,tributary_cli=info)
"#)]
struct Cli {
    /// Cache root directory (overrides config)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch what changed since the last sync
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
    /// Show the sync history of a cache
    Status {
        #[command(subcommand)]
        target: StatusTarget,
    },
}

#[derive(Subcommand)]
enum SyncTarget {
    /// Sync pulls, commits and Actions data of a GitHub repository
    #[cfg(feature = "github")]
    Github {
        /// Repository as OWNER/REPO
        repo: RepoSlug,

        /// Skip items older than this (RFC 3339 or YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        /// Disable proactive rate limiting (may cause API throttling)
        #[arg(short = 'R', long)]
        no_rate_limit: bool,
    },
    /// Sync Jira issues
    #[cfg(feature = "jira")]
    Jira {
        /// Issue filter (overrides config)
        #[arg(long)]
        jql: Option<String>,

        /// Skip items older than this (RFC 3339 or YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand)]
enum StatusTarget {
    /// Cache of a GitHub repository
    Github {
        /// Repository as OWNER/REPO
        repo: RepoSlug,
    },
    /// Cache of the configured Jira account
    Jira,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("tributary=info,tributary_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();
    let cache_dir = cli.cache_dir.as_deref();

    match cli.command {
        Commands::Sync { target } => {
            let signal = AbortSignal::new();
            shutdown::setup_shutdown_handler(signal.clone());

            match target {
                #[cfg(feature = "github")]
                SyncTarget::Github {
                    repo,
                    since,
                    no_rate_limit,
                } => {
                    commands::github::handle_sync(
                        &config,
                        cache_dir,
                        &repo,
                        since,
                        no_rate_limit,
                        signal,
                    )
                    .await?;
                }
                #[cfg(feature = "jira")]
                SyncTarget::Jira { jql, since } => {
                    commands::jira::handle_sync(&config, cache_dir, jql.as_deref(), since, signal)
                        .await?;
                }
            }
        }
        Commands::Status { target } => match target {
            StatusTarget::Github { repo } => {
                let scope = CacheScope::github(&repo.owner, &repo.repo);
                commands::status::handle_status(
                    &config,
                    cache_dir,
                    &scope,
                    &commands::status::GITHUB_ENTITY_TYPES,
                )
                .await?;
            }
            StatusTarget::Jira => {
                let host = config.jira.host.clone().ok_or("No Jira host configured")?;
                let user = config.jira.user.clone().ok_or("No Jira user configured")?;
                commands::status::handle_status(
                    &config,
                    cache_dir,
                    &CacheScope::jira(host, user),
                    &[tributary::EntityType::JiraIssue],
                )
                .await?;
            }
        },
    }

    Ok(())
}
