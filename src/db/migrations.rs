use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 2;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        // Must be set outside a transaction to take effect
        conn.execute("PRAGMA foreign_keys=ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn).unwrap_or(0);

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
            log::debug!("Applied schema migration v{}", version);
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

type Migration = fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>;

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, Migration> {
    let mut migrations: HashMap<u32, Migration> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations
}

/// Migration v1: ACL schema
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    // Security identities: principals (principal = 1) and granted authorities
    tx.execute(
        "CREATE TABLE acl_sid (
            id INTEGER PRIMARY KEY,
            principal INTEGER NOT NULL CHECK(principal IN (0, 1)),
            sid TEXT NOT NULL,
            UNIQUE(sid, principal)
        )",
        [],
    )?;

    // Securable types, keyed by entity type name
    tx.execute(
        "CREATE TABLE acl_class (
            id INTEGER PRIMARY KEY,
            class TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE acl_object_identity (
            id INTEGER PRIMARY KEY,
            object_id_class INTEGER NOT NULL REFERENCES acl_class(id),
            object_id_identity INTEGER NOT NULL,
            parent_object INTEGER NULL REFERENCES acl_object_identity(id),
            owner_sid INTEGER NULL REFERENCES acl_sid(id),
            entries_inheriting INTEGER NOT NULL DEFAULT 1,
            UNIQUE(object_id_class, object_id_identity)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE acl_entry (
            id INTEGER PRIMARY KEY,
            acl_object_identity INTEGER NOT NULL REFERENCES acl_object_identity(id) ON DELETE CASCADE,
            ace_order INTEGER NOT NULL,
            sid INTEGER NOT NULL REFERENCES acl_sid(id),
            mask INTEGER NOT NULL,
            granting INTEGER NOT NULL DEFAULT 1,
            audit_success INTEGER NOT NULL DEFAULT 0,
            audit_failure INTEGER NOT NULL DEFAULT 0,
            UNIQUE(acl_object_identity, ace_order)
        )",
        [],
    )?;

    tx.execute("CREATE INDEX idx_acl_entry_sid_mask ON acl_entry(sid, mask)", [])?;

    Ok(())
}

/// Migration v2: registry tables
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE news (
            id INTEGER PRIMARY KEY,
            visible_from TEXT NULL,
            visible_to TEXT NULL,
            subject TEXT NOT NULL,
            text TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 0,
            created_by TEXT NULL,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NULL,
            created_by TEXT NULL,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}
