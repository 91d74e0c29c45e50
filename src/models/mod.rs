// Registry entities
// Each model describes its table through an EntitySchema so it can be
// queried with filter predicates and ACL restrictions

pub mod news;
pub mod tag;

pub use news::*;
pub use tag::*;

use crate::error::RegisterError;
use crate::query::EntitySchema;

/// Every securable entity schema
pub static SCHEMAS: &[&EntitySchema] = &[&NEWS_SCHEMA, &TAG_SCHEMA];

/// Look up an entity schema by name, ignoring case
pub fn schema_by_name(name: &str) -> Result<&'static EntitySchema, RegisterError> {
    SCHEMAS
        .iter()
        .copied()
        .find(|schema| schema.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| RegisterError::UnknownEntity(name.to_string()))
}
