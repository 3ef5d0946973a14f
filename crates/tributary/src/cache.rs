//! Document cache operations.
//!
//! Each [`Document`](crate::model::Document) type is its own collection
//! inside the `documents` table. Natural keys are unique per collection only
//! through [`upsert`] and [`replace_children`]; the table itself enforces
//! nothing.

mod documents;
mod errors;
mod query;
pub mod sync_info;

pub use documents::{
    DEFAULT_WRITE_BACKOFF_MS, DEFAULT_WRITE_RETRIES, count, delete_many, find, insert,
    replace_children, upsert,
};
pub use errors::{CacheError, Result};
pub use query::DocumentQuery;
