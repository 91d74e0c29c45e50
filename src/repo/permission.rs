use crate::acl::security::SYSTEM_PRINCIPAL;
use crate::acl::{ObjectIdentity, Permission, Sid};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

/// One access control entry of an object's ACL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclEntry {
    pub id: i64,
    pub ace_order: i64,
    pub sid: String,
    pub principal: bool,
    pub mask: u32,
    pub granting: bool,
}

/// Grant and revoke ACL entries
///
/// An object's ACL (its `acl_object_identity` row) is created on the first
/// grant and removed when its last entry is revoked. Entries keep a dense
/// `ace_order` starting at 0.
pub struct PermissionRepo;

impl PermissionRepo {
    /// Grant `permission` on `oid` to `recipient`
    pub fn grant(conn: &Connection, oid: &ObjectIdentity, recipient: &Sid, permission: Permission) -> Result<()> {
        let tx = conn.unchecked_transaction()?;

        let oid_id = match Self::find_object_identity(&tx, oid)? {
            Some(id) => id,
            None => Self::create_acl(&tx, oid, &Sid::principal(SYSTEM_PRINCIPAL))?,
        };
        let sid_id = Self::ensure_sid(&tx, recipient)?;

        let next_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(ace_order) + 1, 0) FROM acl_entry WHERE acl_object_identity = ?1",
            [oid_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO acl_entry (acl_object_identity, ace_order, sid, mask, granting, audit_success, audit_failure)
             VALUES (?1, ?2, ?3, ?4, 1, 0, 0)",
            rusqlite::params![oid_id, next_order, sid_id, permission.mask()],
        )
        .with_context(|| format!("Failed to grant {} on {} {} to {}", permission, oid.class, oid.identifier, recipient.name()))?;

        tx.commit()?;
        log::info!("Granted {} on {} {} to {}", permission, oid.class, oid.identifier, recipient.name());
        Ok(())
    }

    /// Grant `permission` on `oid` to each recipient
    pub fn grant_all(conn: &Connection, oid: &ObjectIdentity, permission: Permission, recipients: &[Sid]) -> Result<()> {
        for recipient in recipients {
            Self::grant(conn, oid, recipient, permission)?;
        }
        Ok(())
    }

    /// Remove every entry of `recipient` with exactly `permission`
    pub fn revoke(conn: &Connection, oid: &ObjectIdentity, recipient: &Sid, permission: Permission) -> Result<()> {
        Self::remove_entries(conn, oid, recipient, Some(permission))
    }

    /// Remove every entry of `recipient`, whatever the mask
    pub fn revoke_all(conn: &Connection, oid: &ObjectIdentity, recipient: &Sid) -> Result<()> {
        Self::remove_entries(conn, oid, recipient, None)
    }

    /// Drop the object's ACL and all its entries
    pub fn delete_acl(conn: &Connection, oid: &ObjectIdentity) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        Self::remove_acl(&tx, oid)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete the ACL rows without opening a transaction; the caller owns it.
    /// Returns whether an ACL existed.
    pub(crate) fn remove_acl(conn: &Connection, oid: &ObjectIdentity) -> Result<bool> {
        let Some(oid_id) = Self::find_object_identity(conn, oid)? else {
            return Ok(false);
        };
        conn.execute("DELETE FROM acl_entry WHERE acl_object_identity = ?1", [oid_id])
            .with_context(|| format!("Failed to delete ACL entries of {} {}", oid.class, oid.identifier))?;
        conn.execute("DELETE FROM acl_object_identity WHERE id = ?1", [oid_id])
            .with_context(|| format!("Failed to delete ACL of {} {}", oid.class, oid.identifier))?;
        log::info!("Deleted ACL of {} {}", oid.class, oid.identifier);
        Ok(true)
    }

    /// Entries of the object's ACL in `ace_order`
    pub fn entries(conn: &Connection, oid: &ObjectIdentity) -> Result<Vec<AclEntry>> {
        let mut stmt = conn.prepare(
            "SELECT e.id, e.ace_order, s.sid, s.principal, e.mask, e.granting
             FROM acl_entry e
             JOIN acl_object_identity oi ON oi.id = e.acl_object_identity
             JOIN acl_class c ON c.id = oi.object_id_class
             JOIN acl_sid s ON s.id = e.sid
             WHERE c.class = ?1 AND oi.object_id_identity = ?2
             ORDER BY e.ace_order",
        )?;
        let rows = stmt.query_map(rusqlite::params![oid.class, oid.identifier], |row| {
            Ok(AclEntry {
                id: row.get(0)?,
                ace_order: row.get(1)?,
                sid: row.get(2)?,
                principal: row.get::<_, i64>(3)? != 0,
                mask: row.get(4)?,
                granting: row.get::<_, i64>(5)? != 0,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Id of the object's `acl_object_identity` row, if it has an ACL
    pub fn find_object_identity(conn: &Connection, oid: &ObjectIdentity) -> Result<Option<i64>> {
        let id = conn
            .query_row(
                "SELECT oi.id FROM acl_object_identity oi
                 JOIN acl_class c ON c.id = oi.object_id_class
                 WHERE c.class = ?1 AND oi.object_id_identity = ?2",
                rusqlite::params![oid.class, oid.identifier],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Create an empty ACL for `oid` owned by `owner`
    pub fn create_acl(conn: &Connection, oid: &ObjectIdentity, owner: &Sid) -> Result<i64> {
        let class_id = Self::ensure_class(conn, &oid.class)?;
        let owner_id = Self::ensure_sid(conn, owner)?;

        conn.execute(
            "INSERT INTO acl_object_identity (object_id_class, object_id_identity, parent_object, owner_sid, entries_inheriting)
             VALUES (?1, ?2, NULL, ?3, 1)",
            rusqlite::params![class_id, oid.identifier, owner_id],
        )
        .with_context(|| format!("Failed to create ACL for {} {}", oid.class, oid.identifier))?;

        Ok(conn.last_insert_rowid())
    }

    fn ensure_class(conn: &Connection, class: &str) -> Result<i64> {
        conn.execute("INSERT OR IGNORE INTO acl_class (class) VALUES (?1)", [class])?;
        let id = conn.query_row("SELECT id FROM acl_class WHERE class = ?1", [class], |row| row.get(0))?;
        Ok(id)
    }

    fn ensure_sid(conn: &Connection, sid: &Sid) -> Result<i64> {
        let principal = sid.is_principal() as i64;
        conn.execute(
            "INSERT OR IGNORE INTO acl_sid (principal, sid) VALUES (?1, ?2)",
            rusqlite::params![principal, sid.name()],
        )?;
        let id = conn.query_row(
            "SELECT id FROM acl_sid WHERE principal = ?1 AND sid = ?2",
            rusqlite::params![principal, sid.name()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn remove_entries(
        conn: &Connection,
        oid: &ObjectIdentity,
        recipient: &Sid,
        permission: Option<Permission>,
    ) -> Result<()> {
        let Some(oid_id) = Self::find_object_identity(conn, oid)? else {
            // Nothing granted, nothing to revoke
            return Ok(());
        };

        let tx = conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM acl_entry
             WHERE acl_object_identity = ?1
               AND sid = (SELECT id FROM acl_sid WHERE sid = ?2 AND principal = ?3)
               AND (?4 IS NULL OR mask = ?4)",
            rusqlite::params![
                oid_id,
                recipient.name(),
                recipient.is_principal() as i64,
                permission.map(|p| p.mask())
            ],
        )?;

        let remaining: Vec<(i64, i64)> = {
            let mut stmt = tx.prepare(
                "SELECT id, ace_order FROM acl_entry WHERE acl_object_identity = ?1 ORDER BY ace_order",
            )?;
            let rows = stmt.query_map([oid_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        if remaining.is_empty() {
            tx.execute("DELETE FROM acl_object_identity WHERE id = ?1", [oid_id])?;
        } else {
            for (index, (entry_id, order)) in remaining.iter().enumerate() {
                if *order != index as i64 {
                    tx.execute(
                        "UPDATE acl_entry SET ace_order = ?1 WHERE id = ?2",
                        rusqlite::params![index as i64, entry_id],
                    )?;
                }
            }
        }

        tx.commit()?;
        log::info!(
            "Revoked {} entr{} of {} on {} {}",
            removed,
            if removed == 1 { "y" } else { "ies" },
            recipient.name(),
            oid.class,
            oid.identifier
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    fn news(id: i64) -> ObjectIdentity {
        ObjectIdentity::new("News", id)
    }

    #[test]
    fn test_grant_creates_acl() {
        let conn = DbConnection::connect_in_memory().unwrap();
        assert!(PermissionRepo::find_object_identity(&conn, &news(1)).unwrap().is_none());

        PermissionRepo::grant(&conn, &news(1), &Sid::principal("alice"), Permission::READ).unwrap();
        assert!(PermissionRepo::find_object_identity(&conn, &news(1)).unwrap().is_some());

        let entries = PermissionRepo::entries(&conn, &news(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sid, "alice");
        assert!(entries[0].principal);
        assert_eq!(entries[0].mask, 1);
        assert!(entries[0].granting);
        assert_eq!(entries[0].ace_order, 0);
    }

    #[test]
    fn test_grant_appends_in_order() {
        let conn = DbConnection::connect_in_memory().unwrap();
        PermissionRepo::grant_all(
            &conn,
            &news(1),
            Permission::ADMINISTRATION,
            &[Sid::authority("ROLE_ADMIN"), Sid::authority("ROLE_EDITOR")],
        )
        .unwrap();
        PermissionRepo::grant(&conn, &news(1), &Sid::authority("ROLE_USER"), Permission::READ).unwrap();

        let entries = PermissionRepo::entries(&conn, &news(1)).unwrap();
        let orders: Vec<i64> = entries.iter().map(|e| e.ace_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(entries[2].sid, "ROLE_USER");
        assert!(!entries[2].principal);
    }

    #[test]
    fn test_revoke_renumbers() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let alice = Sid::principal("alice");
        let bob = Sid::principal("bob");
        PermissionRepo::grant(&conn, &news(1), &alice, Permission::READ).unwrap();
        PermissionRepo::grant(&conn, &news(1), &bob, Permission::READ).unwrap();
        PermissionRepo::grant(&conn, &news(1), &alice, Permission::WRITE).unwrap();

        PermissionRepo::revoke(&conn, &news(1), &alice, Permission::READ).unwrap();

        let entries = PermissionRepo::entries(&conn, &news(1)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].sid.as_str(), entries[0].ace_order), ("bob", 0));
        assert_eq!((entries[1].sid.as_str(), entries[1].mask, entries[1].ace_order), ("alice", 2, 1));
    }

    #[test]
    fn test_revoke_last_entry_removes_acl() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let alice = Sid::principal("alice");
        PermissionRepo::grant(&conn, &news(1), &alice, Permission::READ).unwrap();
        PermissionRepo::revoke(&conn, &news(1), &alice, Permission::READ).unwrap();

        assert!(PermissionRepo::find_object_identity(&conn, &news(1)).unwrap().is_none());
    }

    #[test]
    fn test_revoke_all() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let alice = Sid::principal("alice");
        PermissionRepo::grant(&conn, &news(1), &alice, Permission::READ).unwrap();
        PermissionRepo::grant(&conn, &news(1), &alice, Permission::WRITE).unwrap();
        PermissionRepo::grant(&conn, &news(1), &Sid::principal("bob"), Permission::READ).unwrap();

        PermissionRepo::revoke_all(&conn, &news(1), &alice).unwrap();

        let entries = PermissionRepo::entries(&conn, &news(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sid, "bob");
    }

    #[test]
    fn test_revoke_without_acl_is_noop() {
        let conn = DbConnection::connect_in_memory().unwrap();
        PermissionRepo::revoke(&conn, &news(42), &Sid::principal("alice"), Permission::READ).unwrap();
    }

    #[test]
    fn test_delete_acl() {
        let conn = DbConnection::connect_in_memory().unwrap();
        PermissionRepo::grant(&conn, &news(1), &Sid::principal("alice"), Permission::READ).unwrap();
        PermissionRepo::delete_acl(&conn, &news(1)).unwrap();
        assert!(PermissionRepo::entries(&conn, &news(1)).unwrap().is_empty());
        assert!(PermissionRepo::find_object_identity(&conn, &news(1)).unwrap().is_none());
    }
}
