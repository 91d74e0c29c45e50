//! Filter operators and the lexical tokens of the filter grammar

use serde::Serialize;
use std::fmt;

/// Single-character operator symbols, in the order they are tried
pub const SIMPLE_OPERATION_SET: &[char] = &[':', '!', '>', '<', '~'];

/// Marks a criterion in a flat list as OR-joined with the one before it
pub const OR_PREDICATE_FLAG: &str = "'";

/// Wildcard marker (zero or more characters)
pub const ZERO_OR_MORE: char = '*';

pub const OR_OPERATOR: &str = "OR";
pub const AND_OPERATOR: &str = "AND";
pub const LEFT_PARENTHESIS: &str = "(";
pub const RIGHT_PARENTHESIS: &str = ")";

/// Null sentinel, compared case-insensitively
pub const NULL: &str = "NULL";

/// Comparison operators a criterion can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperation {
    Equality,
    Negation,
    GreaterThan,
    LessThan,
    Like,
    StartsWith,
    EndsWith,
    Contains,
}

impl FilterOperation {
    /// Map an operator symbol to its operation. Unknown symbols yield `None`.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            ':' => Some(FilterOperation::Equality),
            '!' => Some(FilterOperation::Negation),
            '>' => Some(FilterOperation::GreaterThan),
            '<' => Some(FilterOperation::LessThan),
            '~' => Some(FilterOperation::Like),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperation::Equality => "EQUALITY",
            FilterOperation::Negation => "NEGATION",
            FilterOperation::GreaterThan => "GREATER_THAN",
            FilterOperation::LessThan => "LESS_THAN",
            FilterOperation::Like => "LIKE",
            FilterOperation::StartsWith => "STARTS_WITH",
            FilterOperation::EndsWith => "ENDS_WITH",
            FilterOperation::Contains => "CONTAINS",
        }
    }

    /// Whether the operation honours the `NULL` sentinel
    pub fn accepts_null(&self) -> bool {
        matches!(self, FilterOperation::Equality | FilterOperation::Negation)
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connective between two predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Recognise a connective token, case-insensitively
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case(AND_OPERATOR) {
            Some(Connective::And)
        } else if token.eq_ignore_ascii_case(OR_OPERATOR) {
            Some(Connective::Or)
        } else {
            None
        }
    }

    /// Binding strength; AND binds tighter than OR
    pub fn precedence(&self) -> u8 {
        match self {
            Connective::Or => 1,
            Connective::And => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => AND_OPERATOR,
            Connective::Or => OR_OPERATOR,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `value` is the null sentinel
pub fn is_null_sentinel(value: Option<&str>) -> bool {
    value.map_or(false, |v| v.eq_ignore_ascii_case(NULL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(FilterOperation::from_symbol(':'), Some(FilterOperation::Equality));
        assert_eq!(FilterOperation::from_symbol('!'), Some(FilterOperation::Negation));
        assert_eq!(FilterOperation::from_symbol('>'), Some(FilterOperation::GreaterThan));
        assert_eq!(FilterOperation::from_symbol('<'), Some(FilterOperation::LessThan));
        assert_eq!(FilterOperation::from_symbol('~'), Some(FilterOperation::Like));
        assert_eq!(FilterOperation::from_symbol('='), None);
        assert_eq!(FilterOperation::from_symbol('*'), None);
    }

    #[test]
    fn test_every_symbol_maps() {
        for symbol in SIMPLE_OPERATION_SET {
            assert!(FilterOperation::from_symbol(*symbol).is_some());
        }
    }

    #[test]
    fn test_connective_parse() {
        assert_eq!(Connective::parse("AND"), Some(Connective::And));
        assert_eq!(Connective::parse("and"), Some(Connective::And));
        assert_eq!(Connective::parse("Or"), Some(Connective::Or));
        assert_eq!(Connective::parse("xor"), None);
    }

    #[test]
    fn test_precedence() {
        assert!(Connective::And.precedence() > Connective::Or.precedence());
    }

    #[test]
    fn test_null_sentinel() {
        assert!(is_null_sentinel(Some("NULL")));
        assert!(is_null_sentinel(Some("null")));
        assert!(!is_null_sentinel(Some("nil")));
        assert!(!is_null_sentinel(None));
    }
}
