//! Query building blocks shared by the repositories: predicates, entity
//! schemas, SQL rendering and pagination

pub mod page;
pub mod predicate;
pub mod schema;
pub mod sql;

pub use page::{Direction, Order, Page, Pageable, Sort};
pub use predicate::Predicate;
pub use schema::{Column, Entity, EntitySchema, FieldKind};
pub use sql::{render_predicate, SqlFragment};
