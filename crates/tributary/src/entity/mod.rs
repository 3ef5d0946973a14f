//! SeaORM entity definitions for the cache schema.

pub mod document;
pub mod entity_type;
pub mod prelude;
pub mod sync_info;
