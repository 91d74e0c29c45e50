//! Filter string parser
//!
//! Turns a filter string into a postfix (reverse Polish) token stream using
//! the shunting-yard algorithm.
//!
//! # Grammar
//!
//! ```text
//! token      := key operator [prefix] value [suffix]
//! operator   := ':' | '!' | '>' | '<' | '~'
//! connective := 'AND' | 'OR'        (case-insensitive)
//! grouping   := '(' | ')'
//! filter     := token (WS (connective|grouping) WS token)*
//! ```
//!
//! # Precedence
//!
//! 1. Parentheses
//! 2. `AND`
//! 3. `OR` (lowest)
//!
//! Tokens are whitespace separated. Parentheses may stand on their own or be
//! attached to a term: `( a:1 OR b:2 )` and `(a:1 OR b:2)` are the same.
//!
//! The grammar is forgiving: tokens that are neither connectives, grouping
//! symbols nor criteria are dropped, and unbalanced parentheses are ignored.
//!
//! # Example
//!
//! ```
//! use register::filter::{parse_filter, PostfixToken};
//!
//! let postfix = parse_filter("name:John AND age>18");
//! assert_eq!(postfix.len(), 3);
//! assert!(matches!(postfix[2], PostfixToken::Connective(_)));
//! ```

use crate::filter::criteria::FilterCriteria;
use crate::filter::operation::{Connective, LEFT_PARENTHESIS, RIGHT_PARENTHESIS, SIMPLE_OPERATION_SET};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// One lexical token of a filter string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Criterion(FilterCriteria),
    And,
    Or,
    LParen,
    RParen,
    /// Anything else; skipped by [`parse_filter`]
    Unparseable(String),
}

/// Element of a postfix stream: an operand or a connective
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PostfixToken {
    Criterion(FilterCriteria),
    Connective(Connective),
}

impl fmt::Display for PostfixToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostfixToken::Criterion(criteria) => write!(f, "{}", criteria),
            PostfixToken::Connective(connective) => write!(f, "{}", connective),
        }
    }
}

/// Entries on the operator stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackEntry {
    Connective(Connective),
    LeftParen,
}

fn criteria_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let operators = SIMPLE_OPERATION_SET
            .iter()
            .map(|c| regex::escape(&c.to_string()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"^(\w+?)({})([[:punct:]]?)(\w+?)([[:punct:]]?)$",
            operators
        );
        Regex::new(&pattern).expect("criteria pattern is valid")
    })
}

/// Match a single token against `<key><op>[prefix]<value>[suffix]`
pub fn parse_criterion(token: &str) -> Option<FilterCriteria> {
    let caps = criteria_pattern().captures(token)?;
    let non_empty = |i: usize| caps.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty());

    FilterCriteria::from_parts(
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
        non_empty(3),
        caps.get(4)?.as_str(),
        non_empty(5),
    )
}

/// Split a filter string on whitespace and classify each piece.
///
/// Parentheses may stand alone or hug a term, as in `(a:1 OR b:2)`.
pub fn tokenize(filter: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for piece in filter.split_whitespace() {
        let inner = piece.trim_start_matches(LEFT_PARENTHESIS);
        tokens.extend(std::iter::repeat(Token::LParen).take(piece.len() - inner.len()));

        let term = inner.trim_end_matches(RIGHT_PARENTHESIS);
        let closing = inner.len() - term.len();

        if !term.is_empty() {
            tokens.push(classify(term));
        }
        tokens.extend(std::iter::repeat(Token::RParen).take(closing));
    }

    tokens
}

fn classify(raw: &str) -> Token {
    if let Some(connective) = Connective::parse(raw) {
        match connective {
            Connective::And => Token::And,
            Connective::Or => Token::Or,
        }
    } else if let Some(criteria) = parse_criterion(raw) {
        Token::Criterion(criteria)
    } else {
        Token::Unparseable(raw.to_string())
    }
}

/// Parse a filter string into a postfix token stream.
///
/// Blank input yields an empty stream.
pub fn parse_filter(filter: &str) -> Vec<PostfixToken> {
    let mut output: Vec<PostfixToken> = Vec::new();
    let mut stack: Vec<StackEntry> = Vec::new();

    for token in tokenize(filter) {
        match token {
            Token::And | Token::Or => {
                let current = if token == Token::Or { Connective::Or } else { Connective::And };
                while let Some(StackEntry::Connective(top)) = stack.last().copied() {
                    if top.precedence() < current.precedence() {
                        break;
                    }
                    stack.pop();
                    output.push(PostfixToken::Connective(top));
                }
                stack.push(StackEntry::Connective(current));
            }
            Token::LParen => stack.push(StackEntry::LeftParen),
            Token::RParen => {
                let mut matched = false;
                while let Some(entry) = stack.pop() {
                    match entry {
                        StackEntry::LeftParen => {
                            matched = true;
                            break;
                        }
                        StackEntry::Connective(c) => output.push(PostfixToken::Connective(c)),
                    }
                }
                if !matched {
                    log::warn!("Ignoring unbalanced ')' in filter: {}", filter);
                }
            }
            Token::Criterion(criteria) => output.push(PostfixToken::Criterion(criteria)),
            Token::Unparseable(raw) => {
                log::trace!("Dropping unparseable filter token: {}", raw);
            }
        }
    }

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Connective(c) => output.push(PostfixToken::Connective(c)),
            StackEntry::LeftParen => log::warn!("Ignoring unbalanced '(' in filter: {}", filter),
        }
    }

    log::debug!(
        "Parsed filter '{}' into postfix [{}]",
        filter,
        output.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
    );

    output
}

/// [`parse_filter`] for an optional filter; `None` yields an empty stream
pub fn parse_optional(filter: Option<&str>) -> Vec<PostfixToken> {
    filter.map(parse_filter).unwrap_or_default()
}
