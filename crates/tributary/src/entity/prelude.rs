//! Common re-exports for convenient entity usage.

pub use super::document::{
    ActiveModel as DocumentActiveModel, Column as DocumentColumn, Entity as DocumentEntity,
    Model as DocumentModel,
};
pub use super::entity_type::EntityType;
pub use super::sync_info::{
    ActiveModel as SyncInfoActiveModel, Column as SyncInfoColumn, Entity as SyncInfoEntity,
    Model as SyncInfoModel,
};
