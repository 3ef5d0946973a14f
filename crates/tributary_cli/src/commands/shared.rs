use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::DatabaseConnection;
use tributary::sync::SyncError;
use tributary::{AbortSignal, CacheScope, SyncOptions, connect_scope};

use crate::config::Config;
use crate::progress::LoggingReporter;

/// `owner/repo` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RepoSlug {
    pub(crate) owner: String,
    pub(crate) repo: String,
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(format!("expected OWNER/REPO, got '{s}'")),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Parse `--since` as RFC 3339 or a plain `YYYY-MM-DD` date (midnight UTC).
pub(crate) fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|e| format!("invalid date '{s}': {e}"))
}

/// Open the migrated cache of `scope`.
pub(crate) async fn open_cache(
    config: &Config,
    cache_dir: Option<&Path>,
    scope: &CacheScope,
) -> Result<DatabaseConnection, Box<dyn Error>> {
    let root: PathBuf = cache_dir
        .map(Path::to_path_buf)
        .or_else(|| config.cache_dir())
        .ok_or("Could not determine a cache directory; set [cache] dir")?;

    tracing::debug!(scope = %scope, root = %root.display(), "Using cache");
    Ok(connect_scope(&root, scope).await?)
}

/// Options for one sync command run.
pub(crate) fn sync_options(since: Option<DateTime<Utc>>, signal: AbortSignal) -> SyncOptions {
    let options = SyncOptions::default()
        .signal(signal)
        .progress(LoggingReporter::new().into_callback());
    match since {
        Some(since) => options.newer_than(since),
        None => options,
    }
}

/// Log a failed sync and hand the error back for `main` to return.
pub(crate) fn report_failure(err: SyncError) -> Box<dyn Error> {
    let entity_type = err.entity_type();
    let committed = err.committed();
    if err.is_aborted() {
        tracing::warn!(
            %entity_type,
            committed,
            "Sync interrupted; committed items are kept and the next run resumes"
        );
    } else {
        tracing::error!(
            %entity_type,
            kind = err.kind(),
            committed,
            error = %err,
            "Sync failed"
        );
    }
    Box::new(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_repo_slug_parses_owner_and_repo() {
        let slug: RepoSlug = "rust-lang/rust".parse().unwrap();
        assert_eq!(slug.owner, "rust-lang");
        assert_eq!(slug.repo, "rust");
        assert_eq!(slug.to_string(), "rust-lang/rust");
    }

    #[test]
    fn test_repo_slug_rejects_malformed_input() {
        for input in ["rust", "/rust", "rust-lang/", "a/b/c"] {
            assert!(input.parse::<RepoSlug>().is_err(), "{input} should fail");
        }
    }

    #[test]
    fn test_parse_since_accepts_dates_and_timestamps() {
        assert_eq!(
            parse_since("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_since("2024-03-01T12:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
        assert!(parse_since("last tuesday").is_err());
    }

    #[test]
    fn test_sync_options_carry_since_and_signal() {
        let signal = AbortSignal::new();
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let options = sync_options(Some(since), signal.clone());
        assert_eq!(options.newer_than, Some(since));
        assert!(options.progress.is_some());

        signal.abort();
        assert!(options.signal.as_ref().is_some_and(AbortSignal::is_aborted));
    }
}
