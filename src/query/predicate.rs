//! Composable predicate tree
//!
//! Predicates refer to entity fields by their public key (e.g. `subject`).
//! Fields are resolved to columns only when the predicate is rendered against
//! an [`EntitySchema`](crate::query::EntitySchema).

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every row
    All,
    Equals { field: String, value: String },
    NotEquals { field: String, value: String },
    IsNull { field: String },
    IsNotNull { field: String },
    GreaterThan { field: String, value: String },
    LessThan { field: String, value: String },
    /// SQL LIKE with `%`/`_` wildcards
    Like { field: String, pattern: String },
    And { predicates: Vec<Predicate> },
    Or { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Equals { field: field.into(), value: value.into() }
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::NotEquals { field: field.into(), value: value.into() }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Predicate::IsNull { field: field.into() }
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Predicate::IsNotNull { field: field.into() }
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::GreaterThan { field: field.into(), value: value.into() }
    }

    pub fn less_than(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::LessThan { field: field.into(), value: value.into() }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like { field: field.into(), pattern: pattern.into() }
    }

    /// Conjunction. `All` is the identity element.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::All, p) | (p, Predicate::All) => p,
            (Predicate::And { mut predicates }, p) => {
                predicates.push(p);
                Predicate::And { predicates }
            }
            (a, b) => Predicate::And { predicates: vec![a, b] },
        }
    }

    /// Disjunction. `All` absorbs the other side.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::All, _) | (_, Predicate::All) => Predicate::All,
            (Predicate::Or { mut predicates }, p) => {
                predicates.push(p);
                Predicate::Or { predicates }
            }
            (a, b) => Predicate::Or { predicates: vec![a, b] },
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::All)
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_and_identity() {
        let base = Predicate::equals("subject", "Hello");
        assert_eq!(Predicate::All.and(base.clone()), base);
        assert_eq!(base.clone().and(Predicate::All), base);
        assert_eq!(Predicate::All.and(Predicate::All), Predicate::All);
    }

    #[test]
    fn test_all_absorbs_or() {
        let p = Predicate::equals("a", "1");
        assert_eq!(p.clone().or(Predicate::All), Predicate::All);
        assert_eq!(Predicate::All.or(p), Predicate::All);
    }

    #[test]
    fn test_and_flattens_left() {
        let p = Predicate::equals("a", "1")
            .and(Predicate::equals("b", "2"))
            .and(Predicate::equals("c", "3"));
        match p {
            Predicate::And { predicates } => assert_eq!(predicates.len(), 3),
            other => panic!("Expected And, got {:?}", other),
        }
    }
}
