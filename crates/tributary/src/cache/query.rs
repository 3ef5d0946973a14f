use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition};

use crate::entity::document::Column;
use crate::entity::entity_type::EntityType;

/// Filter over one entity collection.
///
/// An empty query matches every document of the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub natural_key: Option<String>,
    pub parent_key: Option<String>,
    /// Inclusive lower bound on `updated_at`.
    pub updated_since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `updated_at`.
    pub updated_before: Option<DateTime<Utc>>,
}

impl DocumentQuery {
    /// Match every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match the document with this natural key.
    pub fn by_key(key: impl Into<String>) -> Self {
        Self {
            natural_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Match the children of this parent.
    pub fn by_parent(parent_key: impl Into<String>) -> Self {
        Self {
            parent_key: Some(parent_key.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn updated_since(mut self, since: DateTime<Utc>) -> Self {
        self.updated_since = Some(since);
        self
    }

    #[must_use]
    pub fn updated_before(mut self, before: DateTime<Utc>) -> Self {
        self.updated_before = Some(before);
        self
    }

    pub(crate) fn condition(&self, entity_type: EntityType) -> Condition {
        let mut condition = Condition::all().add(Column::EntityType.eq(entity_type));
        if let Some(key) = &self.natural_key {
            condition = condition.add(Column::NaturalKey.eq(key.clone()));
        }
        if let Some(parent) = &self.parent_key {
            condition = condition.add(Column::ParentKey.eq(parent.clone()));
        }
        if let Some(since) = self.updated_since {
            condition = condition.add(Column::UpdatedAt.gte(since.fixed_offset()));
        }
        if let Some(before) = self.updated_before {
            condition = condition.add(Column::UpdatedAt.lt(before.fixed_offset()));
        }
        condition
    }
}
