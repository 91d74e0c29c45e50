//! The permission restriction, built in three explicit steps
//!
//! 1. resolve the ACL class id of an entity type
//! 2. resolve the object identity rows of that class
//! 3. resolve the identifiers of objects whose entries grant a SID a mask
//!
//! Each step exists both as a composable subquery (nested into the next step
//! and finally into the entity query) and as a standalone lookup.

use crate::acl::permission::Permission;
use crate::acl::security::Sid;
use crate::query::{EntitySchema, SqlFragment};
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

pub struct AclQueries;

impl AclQueries {
    /// Step 1: `acl_class.id` for `class`
    pub fn class_id_subquery(class: &str) -> SqlFragment {
        SqlFragment::new(
            "SELECT c.id FROM acl_class c WHERE c.class = ?",
            vec![Value::Text(class.to_string())],
        )
    }

    /// Step 2: object identity ids registered under `class`
    pub fn object_identity_subquery(class: &str) -> SqlFragment {
        let class_id = Self::class_id_subquery(class);
        SqlFragment::new(
            format!(
                "SELECT oi.id FROM acl_object_identity oi WHERE oi.object_id_class = ({})",
                class_id.sql
            ),
            class_id.params,
        )
    }

    /// `acl_sid.id` of a security identity
    pub fn sid_subquery(sid: &Sid) -> SqlFragment {
        SqlFragment::new(
            "SELECT s.id FROM acl_sid s WHERE s.sid = ? AND s.principal = ?",
            vec![
                Value::Text(sid.name().to_string()),
                Value::Integer(sid.is_principal() as i64),
            ],
        )
    }

    /// Step 3: identifiers of `class` objects with an entry for `sid` at exactly `permission`
    pub fn granted_object_subquery(class: &str, sid: &Sid, permission: Permission) -> SqlFragment {
        let identities = Self::object_identity_subquery(class);
        let sid_id = Self::sid_subquery(sid);

        let sql = format!(
            "SELECT goi.object_id_identity FROM acl_entry e \
             JOIN acl_object_identity goi ON goi.id = e.acl_object_identity \
             JOIN acl_sid gs ON gs.id = e.sid \
             WHERE goi.id IN ({}) AND gs.id = ({}) AND e.mask = ?",
            identities.sql, sid_id.sql
        );

        let mut params = identities.params;
        params.extend(sid_id.params);
        params.push(Value::Integer(permission.mask() as i64));
        SqlFragment::new(sql, params)
    }

    /// Restriction on the entity query: its id is among the granted objects
    pub fn permitted_restriction(
        schema: &EntitySchema,
        alias: &str,
        sid: &Sid,
        permission: Permission,
    ) -> SqlFragment {
        let granted = Self::granted_object_subquery(schema.acl_class, sid, permission);
        SqlFragment::new(
            format!("{}.{} IN ({})", alias, schema.id_column, granted.sql),
            granted.params,
        )
    }

    pub fn class_id(conn: &Connection, class: &str) -> Result<Option<i64>> {
        let fragment = Self::class_id_subquery(class);
        let id = conn
            .query_row(&fragment.sql, params_from_iter(fragment.params.iter()), |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to resolve ACL class: {}", class))?;
        Ok(id)
    }

    pub fn object_identity_ids(conn: &Connection, class: &str) -> Result<Vec<i64>> {
        query_ids(conn, &Self::object_identity_subquery(class))
            .with_context(|| format!("Failed to resolve object identities of {}", class))
    }

    pub fn granted_object_ids(
        conn: &Connection,
        class: &str,
        sid: &Sid,
        permission: Permission,
    ) -> Result<Vec<i64>> {
        query_ids(conn, &Self::granted_object_subquery(class, sid, permission))
            .with_context(|| format!("Failed to resolve {} grants on {} for {}", permission, class, sid.name()))
    }
}

fn query_ids(conn: &Connection, fragment: &SqlFragment) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(&fragment.sql)?;
    let rows = stmt.query_map(params_from_iter(fragment.params.iter()), |row| row.get::<_, i64>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    ids.sort_unstable();
    Ok(ids)
}
