use crate::acl::{Permission, SecurityContext};
use crate::filter::build_filter;
use crate::models::{Tag, TAG_SCHEMA};
use crate::query::{Entity, Page, Pageable, Predicate};
use crate::repo::AclRepo;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

/// Tag repository
pub struct TagRepo;

impl TagRepo {
    /// Insert a tag, returning it with its assigned id
    pub fn create(conn: &Connection, tag: &Tag) -> Result<Tag> {
        conn.execute(
            "INSERT INTO tags (name, description, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![tag.name, tag.description, tag.created_by, tag.created_at],
        )
        .with_context(|| format!("Failed to create tag: {}", tag.name))?;

        let id = conn.last_insert_rowid();
        Ok(Tag {
            id: Some(id),
            ..tag.clone()
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Tag>> {
        Self::get_where(conn, "t.id = ?1", rusqlite::params![id])
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Tag>> {
        Self::get_where(conn, "t.name = ?1", rusqlite::params![name])
    }

    /// Permitted tags matching `filter`; a blank filter matches all
    pub fn find(conn: &Connection, ctx: &SecurityContext, filter: &str, pageable: &Pageable) -> Result<Page<Tag>> {
        let spec = if filter.trim().is_empty() {
            Predicate::All
        } else {
            build_filter(filter)
        };
        AclRepo::find_page(conn, ctx, &spec, pageable, Permission::READ)
    }

    fn get_where(conn: &Connection, condition: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Option<Tag>> {
        let sql = format!(
            "SELECT {} FROM tags t WHERE {}",
            TAG_SCHEMA.select_list("t"),
            condition
        );
        let tag = conn.query_row(&sql, params, |row| Tag::from_row(row)).optional()?;
        Ok(tag)
    }
}
