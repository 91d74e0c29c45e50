//! Sorting and pagination requests and the resulting pages

use crate::error::RegisterError;
use crate::query::schema::EntitySchema;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(property: impl Into<String>) -> Self {
        Self { property: property.into(), direction: Direction::Asc }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self { property: property.into(), direction: Direction::Desc }
    }
}

/// Ordered list of sort orders; empty means unsorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sort {
    pub orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }

    /// Parse `property[,asc|desc]`. A missing direction means ascending;
    /// an unrecognised one yields `None`.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split(',').map(str::trim);
        let property = parts.next().filter(|p| !p.is_empty())?;
        let direction = match parts.next() {
            Some(d) => Direction::from_str(d)?,
            None => Direction::Asc,
        };
        Some(Self::by(vec![Order { property: property.to_string(), direction }]))
    }

    /// `ORDER BY` clause (with leading space) or an empty string when unsorted
    pub fn to_sql(&self, schema: &EntitySchema, alias: &str) -> Result<String, RegisterError> {
        if !self.is_sorted() {
            return Ok(String::new());
        }
        let parts = self
            .orders
            .iter()
            .map(|o| {
                let column = schema.column(&o.property).map_err(|_| RegisterError::UnknownSortProperty {
                    entity: schema.name.to_string(),
                    property: o.property.clone(),
                })?;
                Ok(format!("{}.{} {}", alias, column.column, o.direction.as_sql()))
            })
            .collect::<Result<Vec<_>, RegisterError>>()?;
        Ok(format!(" ORDER BY {}", parts.join(", ")))
    }
}

/// Pagination request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pageable {
    Unpaged,
    Paged { page: u64, size: u64, sort: Sort },
}

impl Pageable {
    /// Zero-based page of `size` rows; a zero size is raised to one
    pub fn of(page: u64, size: u64) -> Self {
        Pageable::Paged { page, size: size.max(1), sort: Sort::unsorted() }
    }

    pub fn sorted(page: u64, size: u64, sort: Sort) -> Self {
        Pageable::Paged { page, size: size.max(1), sort }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, Pageable::Paged { .. })
    }

    /// Rows skipped before this page.
    ///
    /// Fails when `page * size` leaves the range SQLite can bind as an
    /// `OFFSET`.
    pub fn offset(&self) -> Result<u64, RegisterError> {
        match self {
            Pageable::Unpaged => Ok(0),
            Pageable::Paged { page, size, .. } => page
                .checked_mul(*size)
                .filter(|offset| i64::try_from(*offset).is_ok())
                .ok_or_else(|| RegisterError::InvalidValue {
                    field: "page".to_string(),
                    value: format!("{} (size {})", page, size),
                    expected: "a page whose offset fits in a signed 64-bit integer",
                }),
        }
    }

    /// `(offset, limit)` ready to bind to `LIMIT ? OFFSET ?`; `None` when unpaged
    pub fn window(&self) -> Result<Option<(i64, i64)>, RegisterError> {
        match self {
            Pageable::Unpaged => Ok(None),
            Pageable::Paged { size, .. } => {
                let offset = self.offset()? as i64;
                let limit = i64::try_from(*size).map_err(|_| RegisterError::InvalidValue {
                    field: "size".to_string(),
                    value: size.to_string(),
                    expected: "a page size that fits in a signed 64-bit integer",
                })?;
                Ok(Some((offset, limit)))
            }
        }
    }

    /// Sort to apply; unpaged requests run unsorted
    pub fn sort(&self) -> Sort {
        match self {
            Pageable::Unpaged => Sort::unsorted(),
            Pageable::Paged { sort, .. } => sort.clone(),
        }
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Wrap a complete, unpaged result list
    pub fn unpaged(content: Vec<T>) -> Self {
        let total = content.len() as u64;
        Self { content, number: 0, size: total, total_elements: total }
    }

    /// Build a page, running `count` only when the total cannot be inferred
    /// from the page content.
    ///
    /// On the first page (or unpaged) a short page means the content is
    /// everything. On later pages a non-empty short page is the last one, so
    /// the total is `offset + len`.
    pub fn from_lazy<F>(content: Vec<T>, pageable: &Pageable, count: F) -> Result<Self>
    where
        F: FnOnce() -> Result<u64>,
    {
        let len = content.len() as u64;
        let offset = pageable.offset()?;

        let (number, size) = match pageable {
            Pageable::Unpaged => (0, len),
            Pageable::Paged { page, size, .. } => (*page, *size),
        };

        let total = match pageable {
            Pageable::Unpaged => len,
            Pageable::Paged { size, .. } if offset == 0 => {
                if *size > len {
                    len
                } else {
                    count()?
                }
            }
            Pageable::Paged { size, .. } => {
                if len != 0 && *size > len {
                    offset + len
                } else {
                    count()?
                }
            }
        };

        Ok(Self { content, number, size, total_elements: total })
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            1
        } else {
            self.total_elements / self.size + u64::from(self.total_elements % self.size != 0)
        }
    }

    pub fn is_last(&self) -> bool {
        self.number.saturating_add(1) >= self.total_pages()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counted(total: u64, calls: &Cell<u32>) -> impl FnOnce() -> Result<u64> + '_ {
        move || {
            calls.set(calls.get() + 1);
            Ok(total)
        }
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(Sort::parse("subject"), Some(Sort::by(vec![Order::asc("subject")])));
        assert_eq!(Sort::parse("subject,DESC"), Some(Sort::by(vec![Order::desc("subject")])));
        assert_eq!(Sort::parse("subject,sideways"), None);
        assert_eq!(Sort::parse(""), None);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pageable::of(3, 10).offset(), Ok(30));
        assert_eq!(Pageable::Unpaged.offset(), Ok(0));
        assert_eq!(Pageable::of(2, 0).offset(), Ok(2));
    }

    #[test]
    fn test_offset_out_of_range() {
        let err = Pageable::of(u64::MAX, 2).offset().unwrap_err();
        assert!(matches!(err, RegisterError::InvalidValue { ref field, .. } if field == "page"));

        // Fits in u64 but not in a bound i64
        assert!(Pageable::of(1, 1 << 63).offset().is_err());
        assert_eq!(Pageable::of(1, i64::MAX as u64).offset(), Ok(i64::MAX as u64));
    }

    #[test]
    fn test_window() {
        assert_eq!(Pageable::Unpaged.window(), Ok(None));
        assert_eq!(Pageable::of(2, 5).window(), Ok(Some((10, 5))));

        let err = Pageable::of(0, u64::MAX).window().unwrap_err();
        assert!(matches!(err, RegisterError::InvalidValue { ref field, .. } if field == "size"));
    }

    #[test]
    fn test_from_lazy_rejects_overflowing_page() {
        let result = Page::<i32>::from_lazy(vec![], &Pageable::of(u64::MAX, 3), || Ok(0));
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<RegisterError>(), Some(RegisterError::InvalidValue { .. })));
    }

    #[test]
    fn test_total_pages_near_max() {
        let page = Page { content: Vec::<i32>::new(), number: 0, size: u64::MAX, total_elements: u64::MAX };
        assert_eq!(page.total_pages(), 1);
        assert!(page.is_last());
    }

    #[test]
    fn test_first_short_page_skips_count() {
        let calls = Cell::new(0);
        let page = Page::from_lazy(vec![1, 2], &Pageable::of(0, 5), counted(99, &calls)).unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_full_page_runs_count() {
        let calls = Cell::new(0);
        let page = Page::from_lazy(vec![1, 2, 3], &Pageable::of(0, 3), counted(10, &calls)).unwrap();
        assert_eq!(page.total_elements, 10);
        assert_eq!(calls.get(), 1);
        assert_eq!(page.total_pages(), 4);
        assert!(!page.is_last());
    }

    #[test]
    fn test_last_short_page_infers_total() {
        let calls = Cell::new(0);
        let page = Page::from_lazy(vec![10], &Pageable::of(3, 3), counted(99, &calls)).unwrap();
        assert_eq!(page.total_elements, 10);
        assert_eq!(calls.get(), 0);
        assert!(page.is_last());
    }

    #[test]
    fn test_empty_later_page_runs_count() {
        let calls = Cell::new(0);
        let page: Page<i32> = Page::from_lazy(vec![], &Pageable::of(5, 3), counted(4, &calls)).unwrap();
        assert_eq!(page.total_elements, 4);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unpaged() {
        let page = Page::from_lazy(vec!["a", "b"], &Pageable::Unpaged, || Ok(99)).unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_pages(), 1);
    }
}
