use std::error::Error;
use std::path::Path;

use sea_orm::DatabaseConnection;
use tributary::CacheScope;
use tributary::cache::sync_info;
use tributary::entity::entity_type::EntityType;

use super::shared::open_cache;
use crate::config::Config;

/// Entity types cached per GitHub repository.
pub(crate) const GITHUB_ENTITY_TYPES: [EntityType; 5] = [
    EntityType::Pull,
    EntityType::PullCommit,
    EntityType::Commit,
    EntityType::ActionRun,
    EntityType::ActionWorkflow,
];

/// One line of `tributary status`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct StatusLine {
    pub(crate) entity_type: EntityType,
    pub(crate) last_finished: Option<String>,
    pub(crate) interrupted: bool,
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let finished = self.last_finished.as_deref().unwrap_or("never");
        write!(f, "{:<16} last synced {}", self.entity_type.as_str(), finished)?;
        if self.interrupted {
            write!(f, " (last run interrupted)")?;
        }
        Ok(())
    }
}

/// Sync state of each of `entity_types` in `db`.
pub(crate) async fn collect(
    db: &DatabaseConnection,
    entity_types: &[EntityType],
) -> Result<Vec<StatusLine>, Box<dyn Error>> {
    let mut lines = Vec::with_capacity(entity_types.len());
    for &entity_type in entity_types {
        let finished = sync_info::find_latest(db, entity_type, false).await?;
        let latest = sync_info::find_latest(db, entity_type, true).await?;
        lines.push(StatusLine {
            entity_type,
            last_finished: finished
                .and_then(|info| info.updated_at_utc())
                .map(|at| at.to_rfc3339()),
            interrupted: latest.is_some_and(|info| !info.is_finished()),
        });
    }
    Ok(lines)
}

/// `tributary status`
pub(crate) async fn handle_status(
    config: &Config,
    cache_dir: Option<&Path>,
    scope: &CacheScope,
    entity_types: &[EntityType],
) -> Result<(), Box<dyn Error>> {
    let db = open_cache(config, cache_dir, scope).await?;
    println!("{scope}");
    for line in collect(&db, entity_types).await? {
        println!("  {line}");
    }
    Ok(())
}
