//! Document entity - one cached record of any [`EntityType`].
//!
//! The typed payload is stored as JSON. The natural key, optional parent key
//! and the two timestamps are lifted into columns so the cache can filter
//! and order without decoding payloads.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::entity_type::EntityType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Which collection this row belongs to.
    pub entity_type: EntityType,

    /// Natural identifier within the collection (pull number, SHA, node id, ...).
    pub natural_key: String,

    /// Key of the owning entity, e.g. the pull number for a pull commit.
    pub parent_key: Option<String>,

    /// When the entity was created upstream.
    pub created_at: DateTimeWithTimeZone,

    /// When the entity was last updated upstream.
    pub updated_at: DateTimeWithTimeZone,

    /// The entity as fetched.
    #[sea_orm(column_type = "Json")]
    pub payload: serde_json::Value,

    /// When this row was written.
    pub cached_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
