use crate::filter::operation::{FilterOperation, OR_PREDICATE_FLAG, ZERO_OR_MORE};
use serde::Serialize;
use std::fmt;

/// One parsed filter condition
///
/// `value` may hold the `NULL` sentinel, which EQUALITY and NEGATION treat as
/// "field is null" / "field is not null".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub key: String,
    pub operation: FilterOperation,
    pub value: Option<String>,
    /// OR-join with the preceding criterion (flat lists only)
    pub or_predicate: bool,
}

impl FilterCriteria {
    pub fn new(key: impl Into<String>, operation: FilterOperation, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operation,
            value: Some(value.into()),
            or_predicate: false,
        }
    }

    /// Build a criterion from the raw pieces of a matched token.
    ///
    /// `operation` is the operator symbol; only its first character counts.
    /// An EQUALITY whose prefix and/or suffix contains the wildcard marker is
    /// promoted to ENDS_WITH, STARTS_WITH or CONTAINS. Returns `None` when the
    /// symbol is not a known operator.
    pub fn from_parts(
        key: &str,
        operation: &str,
        prefix: Option<&str>,
        value: &str,
        suffix: Option<&str>,
    ) -> Option<Self> {
        let symbol = operation.chars().next()?;
        let op = promote_wildcard(FilterOperation::from_symbol(symbol)?, prefix, suffix);

        Some(Self {
            key: key.to_string(),
            operation: op,
            value: Some(value.to_string()),
            or_predicate: false,
        })
    }

    /// Same as [`FilterCriteria::from_parts`] with the flat-list OR flag.
    /// The criterion is OR-joined when `or_flag` is the `'` marker.
    pub fn with_or_flag(
        or_flag: Option<&str>,
        key: &str,
        operation: &str,
        prefix: Option<&str>,
        value: &str,
        suffix: Option<&str>,
    ) -> Option<Self> {
        let mut criteria = Self::from_parts(key, operation, prefix, value, suffix)?;
        criteria.or_predicate = or_flag == Some(OR_PREDICATE_FLAG);
        Some(criteria)
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.key,
            self.operation,
            self.value.as_deref().unwrap_or("<none>")
        )
    }
}

fn promote_wildcard(op: FilterOperation, prefix: Option<&str>, suffix: Option<&str>) -> FilterOperation {
    if op != FilterOperation::Equality {
        return op;
    }

    let leading = prefix.map_or(false, |p| p.contains(ZERO_OR_MORE));
    let trailing = suffix.map_or(false, |s| s.contains(ZERO_OR_MORE));

    match (leading, trailing) {
        (true, true) => FilterOperation::Contains,
        (true, false) => FilterOperation::EndsWith,
        (false, true) => FilterOperation::StartsWith,
        (false, false) => FilterOperation::Equality,
    }
}
