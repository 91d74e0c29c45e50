use crate::acl::{ObjectIdentity, Permission, SecurityContext};
use crate::error::RegisterError;
use crate::filter::build_filter;
use crate::models::{News, NEWS_SCHEMA};
use crate::query::{Entity, Page, Pageable, Predicate, Sort};
use crate::repo::{AclRepo, PermissionRepo};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

/// News repository
///
/// Reads go through [`AclRepo`], so callers only ever see news items their
/// principal was granted READ on.
///
/// # Example
///
/// ```no_run
/// use register::acl::SecurityContext;
/// use register::db::DbConnection;
/// use register::query::Pageable;
/// use register::repo::NewsRepo;
///
/// let conn = DbConnection::connect().unwrap();
/// let ctx = SecurityContext::for_principal("alice");
/// let page = NewsRepo::find(&conn, &ctx, "published:true", &Pageable::of(0, 20)).unwrap();
/// ```
pub struct NewsRepo;

impl NewsRepo {
    /// Insert a news item, returning it with its assigned id
    pub fn create(conn: &Connection, news: &News) -> Result<News> {
        validate_date("visibleFrom", news.visible_from.as_deref())?;
        validate_date("visibleTo", news.visible_to.as_deref())?;

        conn.execute(
            "INSERT INTO news (visible_from, visible_to, subject, text, published, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                news.visible_from,
                news.visible_to,
                news.subject,
                news.text,
                if news.published { 1 } else { 0 },
                news.created_by,
                news.created_at
            ],
        )
        .with_context(|| format!("Failed to create news: {}", news.subject))?;

        let id = conn.last_insert_rowid();
        Ok(News {
            id: Some(id),
            ..news.clone()
        })
    }

    /// Get news by ID, without permission checks
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<News>> {
        let sql = format!(
            "SELECT {} FROM news t WHERE t.id = ?1",
            NEWS_SCHEMA.select_list("t")
        );
        let news = conn.query_row(&sql, [id], |row| News::from_row(row)).optional()?;
        Ok(news)
    }

    /// Permitted news matching `filter`, one page at a time
    ///
    /// A blank filter lists everything the caller may read.
    pub fn find(conn: &Connection, ctx: &SecurityContext, filter: &str, pageable: &Pageable) -> Result<Page<News>> {
        let spec = if filter.trim().is_empty() {
            Predicate::All
        } else {
            build_filter(filter)
        };
        AclRepo::find_page(conn, ctx, &spec, pageable, Permission::READ)
    }

    /// Every permitted news item in `sort` order
    pub fn find_all(conn: &Connection, ctx: &SecurityContext, sort: &Sort) -> Result<Vec<News>> {
        AclRepo::find(conn, ctx, &Predicate::All, sort, Permission::READ)
    }

    /// Delete a news item together with its ACL, atomically
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        let deleted = tx
            .execute("DELETE FROM news WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete news {}", id))?;
        if deleted == 0 {
            return Err(RegisterError::NotFound {
                entity: NEWS_SCHEMA.name.to_string(),
                id,
            }
            .into());
        }
        PermissionRepo::remove_acl(&tx, &ObjectIdentity::new(NEWS_SCHEMA.acl_class, id))?;
        tx.commit()?;
        Ok(())
    }
}

fn validate_date(field: &str, value: Option<&str>) -> Result<(), RegisterError> {
    match value {
        Some(raw) if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() => Err(RegisterError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            expected: "date (YYYY-MM-DD)",
        }),
        _ => Ok(()),
    }
}
