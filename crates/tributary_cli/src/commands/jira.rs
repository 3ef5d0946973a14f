use std::error::Error;
use std::path::Path;

use chrono::{DateTime, Utc};
use tributary::jira::{JiraClient, JiraConfig};
use tributary::retry::RetryConfig;
use tributary::sync::JiraSyncer;
use tributary::{AbortSignal, CacheScope};

use super::shared::{open_cache, report_failure, sync_options};
use crate::config::Config;

/// Build the client configuration from the loaded config.
pub(crate) fn client_config(
    config: &Config,
    jql: Option<&str>,
) -> Result<JiraConfig, Box<dyn Error>> {
    let jira = &config.jira;
    let host = jira.host.clone().ok_or("No Jira host configured; set [jira] host")?;
    let user = jira.user.clone().ok_or("No Jira user configured; set [jira] user")?;
    let token = jira
        .token
        .clone()
        .ok_or("No Jira token configured; set [jira] token or TRIBUTARY_JIRA__TOKEN")?;

    let mut client_config = JiraConfig::new(host, user, token);
    if let Some(jql) = jql.map(str::to_string).or_else(|| jira.jql.clone()) {
        client_config = client_config.with_jql(jql);
    }
    if let Some(rps) = jira.requests_per_second {
        client_config.requests_per_second = rps;
    }
    client_config.retry = RetryConfig::new(config.sync.max_retries);
    client_config.max_pages = config.sync.max_pages;
    Ok(client_config)
}

/// `tributary sync jira`
pub(crate) async fn handle_sync(
    config: &Config,
    cache_dir: Option<&Path>,
    jql: Option<&str>,
    since: Option<DateTime<Utc>>,
    signal: AbortSignal,
) -> Result<(), Box<dyn Error>> {
    let client_config = client_config(config, jql)?;
    let scope = CacheScope::jira(&client_config.host, &client_config.user);
    let client = JiraClient::new(&client_config)?;
    let db = open_cache(config, cache_dir, &scope).await?;
    let syncer = JiraSyncer::new(client, db);

    tracing::info!(host = %client_config.host, jql = %client_config.jql, "Syncing Jira issues");
    let outcome = syncer
        .sync_issues(&sync_options(since, signal))
        .await
        .map_err(report_failure)?;

    tracing::info!(
        host = %client_config.host,
        issues = outcome.synced_items.len(),
        synced_at = %outcome.synced_at,
        "Sync complete"
    );
    Ok(())
}
