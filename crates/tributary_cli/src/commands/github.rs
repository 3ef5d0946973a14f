use std::error::Error;
use std::path::Path;

use chrono::{DateTime, Utc};
use tributary::github::{GitHubClient, GitHubConfig};
use tributary::retry::RetryConfig;
use tributary::sync::GitHubSyncer;
use tributary::{AbortSignal, CacheScope};

use super::shared::{RepoSlug, open_cache, report_failure, sync_options};
use crate::config::Config;

/// Build the client configuration for `slug` from the loaded config.
pub(crate) fn client_config(
    config: &Config,
    slug: &RepoSlug,
    no_rate_limit: bool,
) -> Result<GitHubConfig, Box<dyn Error>> {
    let token = config
        .github
        .token
        .clone()
        .ok_or("No GitHub token configured; set [github] token or TRIBUTARY_GITHUB__TOKEN")?;

    let mut client_config = GitHubConfig::new(token, &slug.owner, &slug.repo);
    if let Some(base_url) = &config.github.base_url {
        client_config.base_url = base_url.clone();
    }
    if let Some(rps) = config.github.requests_per_second {
        client_config.requests_per_second = rps;
    }
    if no_rate_limit {
        client_config.requests_per_second = 0;
    }
    client_config.retry = RetryConfig::new(config.sync.max_retries);
    client_config.max_pages = config.sync.max_pages;
    Ok(client_config)
}

/// `tributary sync github OWNER/REPO`
pub(crate) async fn handle_sync(
    config: &Config,
    cache_dir: Option<&Path>,
    slug: &RepoSlug,
    since: Option<DateTime<Utc>>,
    no_rate_limit: bool,
    signal: AbortSignal,
) -> Result<(), Box<dyn Error>> {
    let client = GitHubClient::new(&client_config(config, slug, no_rate_limit)?)?;
    let db = open_cache(config, cache_dir, &CacheScope::github(&slug.owner, &slug.repo)).await?;
    let syncer = GitHubSyncer::new(client, db);

    tracing::info!(repo = %slug, "Syncing repository");
    let report = syncer
        .sync_all(&sync_options(since, signal))
        .await
        .map_err(report_failure)?;

    tracing::info!(
        repo = %slug,
        pulls = report.pulls.synced_items.len(),
        pull_commits = report.pull_commits.synced_items.len(),
        commits = report.commits.synced_items.len(),
        action_runs = report.action_runs.synced_items.len(),
        action_workflows = report.action_workflows.synced_items.len(),
        total = report.total_items(),
        "Sync complete"
    );
    Ok(())
}
