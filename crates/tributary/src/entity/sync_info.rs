//! SyncInfo entity - one row per sync attempt of an entity type.
//!
//! `updated_at` is only written when the attempt completes, so a row without
//! it is evidence of an interrupted sync.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::entity_type::EntityType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_infos")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// The entity type this sync covered.
    pub entity_type: EntityType,

    /// When the sync started.
    pub created_at: DateTimeWithTimeZone,

    /// When the sync finished; absent while in flight or after a failure.
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this sync ran to completion.
    pub fn is_finished(&self) -> bool {
        self.updated_at.is_some()
    }

    /// Start time in UTC.
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        self.created_at.with_timezone(&Utc)
    }

    /// Completion time in UTC, if finished.
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_finished() {
        let now = Utc::now().fixed_offset();
        let mut row = Model {
            id: Uuid::new_v4(),
            entity_type: EntityType::Pull,
            created_at: now,
            updated_at: None,
        };
        assert!(!row.is_finished());
        assert_eq!(row.updated_at_utc(), None);

        row.updated_at = Some(now);
        assert!(row.is_finished());
        assert_eq!(row.updated_at_utc(), Some(now.with_timezone(&Utc)));
        assert_eq!(row.created_at_utc(), now.with_timezone(&Utc));
    }
}
