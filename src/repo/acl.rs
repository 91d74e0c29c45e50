use crate::acl::{AclQueries, Permission, SecurityContext, Sid};
use crate::query::{render_predicate, Entity, Page, Pageable, Predicate, Sort, SqlFragment};
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;

/// Alias of the entity table in generated queries
const ROOT: &str = "t";

/// Permission-filtered queries over any [`Entity`]
///
/// Every query is restricted to rows whose identifier has an ACL entry
/// granting the caller's principal the requested permission mask, on top of
/// an optional caller predicate. Calls without an authenticated principal fail
/// with [`RegisterError::AnonymousPrincipal`](crate::error::RegisterError)
/// before anything is queried.
///
/// # Example
///
/// ```no_run
/// use register::acl::{Permission, SecurityContext};
/// use register::db::DbConnection;
/// use register::filter::build_filter;
/// use register::models::News;
/// use register::query::Pageable;
/// use register::repo::AclRepo;
///
/// let conn = DbConnection::connect().unwrap();
/// let ctx = SecurityContext::for_principal("alice");
/// let spec = build_filter("published:true AND subject:*spex*");
/// let page = AclRepo::find_page::<News>(&conn, &ctx, &spec, &Pageable::of(0, 20), Permission::READ).unwrap();
/// ```
pub struct AclRepo;

impl AclRepo {
    /// All permitted rows, unsorted
    pub fn find_all<T: Entity>(conn: &Connection, ctx: &SecurityContext, permission: Permission) -> Result<Vec<T>> {
        Self::find(conn, ctx, &Predicate::All, &Sort::unsorted(), permission)
    }

    /// Permitted rows matching `spec`, in `sort` order
    pub fn find<T: Entity>(
        conn: &Connection,
        ctx: &SecurityContext,
        spec: &Predicate,
        sort: &Sort,
        permission: Permission,
    ) -> Result<Vec<T>> {
        Self::query::<T>(ctx, spec, permission)?.fetch(conn, sort)
    }

    /// One page of permitted rows matching `spec`
    pub fn find_page<T: Entity>(
        conn: &Connection,
        ctx: &SecurityContext,
        spec: &Predicate,
        pageable: &Pageable,
        permission: Permission,
    ) -> Result<Page<T>> {
        Self::query::<T>(ctx, spec, permission)?.fetch_page(conn, pageable)
    }

    /// Build the filtered query without running it
    pub fn query<T: Entity>(
        ctx: &SecurityContext,
        spec: &Predicate,
        permission: Permission,
    ) -> Result<PermittedQuery<T>> {
        let sid = ctx.require_principal()?;
        PermittedQuery::new(spec, &sid, permission)
    }
}

/// A permission-restricted query over `T`, ready to fetch rows or a page
#[derive(Debug)]
pub struct PermittedQuery<T> {
    filter: SqlFragment,
    distinct: bool,
    _entity: PhantomData<T>,
}

impl<T: Entity> PermittedQuery<T> {
    /// `spec AND permitted`, or just `permitted` when `spec` matches all
    pub fn new(spec: &Predicate, sid: &Sid, permission: Permission) -> Result<Self> {
        let schema = T::schema();
        let restriction = AclQueries::permitted_restriction(schema, ROOT, sid, permission);

        let filter = if spec.is_all() {
            restriction
        } else {
            render_predicate(spec, schema, ROOT)?.and(restriction)
        };

        Ok(Self { filter, distinct: false, _entity: PhantomData })
    }

    /// Select distinct rows; the count query then counts distinct ids
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn fetch(&self, conn: &Connection, sort: &Sort) -> Result<Vec<T>> {
        self.select(conn, sort, None)
    }

    /// Unpaged requests return everything as a single page. Paged requests
    /// apply offset/limit and count lazily.
    pub fn fetch_page(&self, conn: &Connection, pageable: &Pageable) -> Result<Page<T>> {
        match pageable {
            Pageable::Unpaged => Ok(Page::unpaged(self.select(conn, &Sort::unsorted(), None)?)),
            Pageable::Paged { sort, .. } => {
                let content = self.select(conn, sort, pageable.window()?)?;
                Page::from_lazy(content, pageable, || self.count(conn))
            }
        }
    }

    pub fn count(&self, conn: &Connection) -> Result<u64> {
        let schema = T::schema();
        let sql = format!(
            "SELECT COUNT({}{}.{}) FROM {} {} WHERE {}",
            if self.distinct { "DISTINCT " } else { "" },
            ROOT,
            schema.id_column,
            schema.table,
            ROOT,
            self.filter.sql
        );
        log::debug!("Count query: {}", sql);

        let total: i64 = conn
            .query_row(&sql, params_from_iter(self.filter.params.iter()), |row| row.get(0))
            .with_context(|| format!("Failed to count {}", schema.name))?;
        Ok(total.max(0) as u64)
    }

    fn select(&self, conn: &Connection, sort: &Sort, window: Option<(i64, i64)>) -> Result<Vec<T>> {
        let schema = T::schema();
        let mut sql = format!(
            "SELECT {}{} FROM {} {} WHERE {}",
            if self.distinct { "DISTINCT " } else { "" },
            schema.select_list(ROOT),
            schema.table,
            ROOT,
            self.filter.sql
        );
        sql.push_str(&sort.to_sql(schema, ROOT)?);

        let mut params = self.filter.params.clone();
        if let Some((offset, limit)) = window {
            // Id as final key keeps pages stable
            sql.push_str(if sort.is_sorted() { ", " } else { " ORDER BY " });
            sql.push_str(&format!("{}.{} ASC LIMIT ? OFFSET ?", ROOT, schema.id_column));
            params.push(Value::Integer(limit));
            params.push(Value::Integer(offset));
        }
        log::debug!("Select query: {}", sql);

        let mut stmt = conn
            .prepare(&sql)
            .with_context(|| format!("Failed to prepare {} query", schema.name))?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| T::from_row(row))?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?);
        }
        Ok(entities)
    }
}
