//! Fold parsed criteria into a single [`Predicate`]
//!
//! Two input shapes are accepted:
//!
//! - a flat list, where each criterion carries its own OR flag relative to
//!   everything before it ([`build_flat`])
//! - a postfix stream from [`parse_filter`](crate::filter::parse_filter)
//!   ([`build_postfix`])
//!
//! Both return [`Predicate::All`] for empty input.

use crate::filter::criteria::FilterCriteria;
use crate::filter::operation::{is_null_sentinel, Connective, FilterOperation};
use crate::filter::parser::{parse_filter, PostfixToken};
use crate::query::Predicate;

/// Predicate for one criterion
pub fn criterion_predicate(criteria: &FilterCriteria) -> Predicate {
    let key = criteria.key.as_str();

    if criteria.operation.accepts_null() && (criteria.value.is_none() || is_null_sentinel(criteria.value())) {
        return match criteria.operation {
            FilterOperation::Negation => Predicate::is_not_null(key),
            _ => Predicate::is_null(key),
        };
    }

    let value = criteria.value().unwrap_or_default();
    match criteria.operation {
        FilterOperation::Equality => Predicate::equals(key, value),
        FilterOperation::Negation => Predicate::not_equals(key, value),
        FilterOperation::GreaterThan => Predicate::greater_than(key, value),
        FilterOperation::LessThan => Predicate::less_than(key, value),
        FilterOperation::Like => Predicate::like(key, value),
        FilterOperation::StartsWith => Predicate::like(key, format!("{}%", value)),
        FilterOperation::EndsWith => Predicate::like(key, format!("%{}", value)),
        FilterOperation::Contains => Predicate::like(key, format!("%{}%", value)),
    }
}

/// Fold a flat criteria list left to right.
///
/// The first criterion's OR flag is ignored; every later criterion is
/// OR-joined to the accumulated predicate when flagged, AND-joined otherwise.
pub fn build_flat(criteria: &[FilterCriteria]) -> Predicate {
    let mut iter = criteria.iter();
    let Some(first) = iter.next() else {
        return Predicate::All;
    };

    iter.fold(criterion_predicate(first), |acc, c| {
        let next = criterion_predicate(c);
        if c.or_predicate {
            acc.or(next)
        } else {
            acc.and(next)
        }
    })
}

/// Evaluate a postfix stream with a predicate stack.
///
/// A connective pops two operands and pushes their combination. Malformed
/// streams are accepted rather than truncated:
///
/// - a connective that finds only one operand leaves that operand on the
///   stack unchanged (`a:1 AND` builds `a:1`)
/// - a connective with no operands is ignored
/// - every operand still on the stack at the end is AND-joined in encounter
///   order, so `a b c OR` builds `a AND (b OR c)` instead of dropping `a`
///
/// An empty stream builds [`Predicate::All`].
pub fn build_postfix(tokens: &[PostfixToken]) -> Predicate {
    let mut stack: Vec<Predicate> = Vec::new();

    for token in tokens {
        match token {
            PostfixToken::Criterion(criteria) => stack.push(criterion_predicate(criteria)),
            PostfixToken::Connective(connective) => {
                let right = stack.pop();
                let left = stack.pop();
                match (left, right) {
                    (Some(left), Some(right)) => stack.push(match connective {
                        Connective::And => left.and(right),
                        Connective::Or => left.or(right),
                    }),
                    (None, Some(only)) => {
                        log::warn!("Dangling {} in filter, keeping single operand", connective);
                        stack.push(only);
                    }
                    _ => log::warn!("Dangling {} in filter without operands", connective),
                }
            }
        }
    }

    if stack.len() > 1 {
        log::debug!("{} operands without connective, joining with AND", stack.len());
    }

    stack.into_iter().fold(Predicate::All, Predicate::and)
}

/// Parse and build in one step
pub fn build_filter(filter: &str) -> Predicate {
    build_postfix(&parse_filter(filter))
}
